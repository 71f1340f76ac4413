//! Password gate: login, logout, and the guard middleware.
//!
//! Authentication is a boolean check against one shared password; success
//! hands out the fixed server token, accepted either as a cookie (browser
//! tabs, WebSocket upgrades) or a bearer header (scripts).

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AppState, AuthConfig};

use super::ApiError;
use scrawl_core::Error;

/// Cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "scrawl_token";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `POST /auth` — exchange the shared password for the session token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.password != state.auth.password {
        debug!(subsystem = "api", component = "auth", "Rejected login attempt");
        return Err(ApiError(Error::Unauthorized("wrong password".to_string())));
    }

    info!(subsystem = "api", component = "auth", "Client authenticated");
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        TOKEN_COOKIE, state.auth.token
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: state.auth.token.clone(),
        }),
    ))
}

/// `POST /logout` — clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{}=; Path=/; HttpOnly; Max-Age=0", TOKEN_COOKIE);
    (
        [(header::SET_COOKIE, cookie)],
        StatusCode::NO_CONTENT,
    )
}

/// Guard middleware for everything behind the gate.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if authorized(&state.auth, request.headers()) {
        next.run(request).await
    } else {
        ApiError(Error::Unauthorized(
            "missing or invalid token".to_string(),
        ))
        .into_response()
    }
}

fn authorized(auth: &AuthConfig, headers: &HeaderMap) -> bool {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            if token == auth.token {
                return true;
            }
        }
    }

    cookie_token(headers).is_some_and(|token| token == auth.token)
}

/// Pull the session token out of the `Cookie` header, if present.
fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == TOKEN_COOKIE).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> AuthConfig {
        AuthConfig {
            password: "hunter2".to_string(),
            token: "tok-123".to_string(),
        }
    }

    #[test]
    fn test_bearer_header_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-123"),
        );
        assert!(authorized(&auth(), &headers));
    }

    #[test]
    fn test_cookie_accepted_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; scrawl_token=tok-123; other=1"),
        );
        assert!(authorized(&auth(), &headers));
    }

    #[test]
    fn test_wrong_or_missing_token_rejected() {
        let mut headers = HeaderMap::new();
        assert!(!authorized(&auth(), &headers));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("scrawl_token=wrong"),
        );
        assert!(!authorized(&auth(), &headers));
    }
}
