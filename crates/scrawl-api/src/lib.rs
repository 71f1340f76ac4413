//! scrawl-api - HTTP server for the scrawl shared notepad.
//!
//! The router and application state are exposed as a library so integration
//! tests can stand up the full server against their own stores and backends.

pub mod handlers;
pub mod origin;
pub mod services;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use scrawl_core::{defaults, NoteEditor, NotifyHub};
use scrawl_db::Database;

use handlers::auth::{login, logout, require_auth};
use handlers::chat::{chat_ws, create_chat, get_chat, list_chats};
use handlers::events::subscribe_events;
use handlers::health;
use handlers::note::{edit_note, note_text, prepend_note, read_note, rollback_note};
use services::ChatService;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// The boolean auth gate: one shared password, one fixed session token.
#[derive(Debug)]
pub struct AuthConfig {
    /// Password accepted by `POST /auth`.
    pub password: String,
    /// Token issued to authenticated clients and checked on every guarded
    /// request (cookie or bearer header).
    pub token: String,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Owns the in-memory note, the debounced persist, and the rollback stack.
    pub editor: Arc<NoteEditor>,
    /// Origin-aware change-notification hub with the bounded registry.
    pub hub: Arc<NotifyHub>,
    /// Chat exchange orchestration over the store and model backend.
    pub chat: ChatService,
    pub auth: Arc<AuthConfig>,
}

/// Build the full application router over the given state.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/api/v1/note", get(read_note))
        .route("/api/v1/note/text", get(note_text))
        .route("/api/v1/note/edit", post(edit_note))
        .route("/api/v1/note/prepend", post(prepend_note))
        .route("/api/v1/note/rollback", post(rollback_note))
        .route("/api/v1/events", get(subscribe_events))
        .route("/api/v1/chats", get(list_chats).post(create_chat))
        .route("/api/v1/chats/:id", get(get_chat))
        .route("/api/v1/chats/ws", get(chat_ws))
        .route("/logout", post(logout))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth", post(login))
        .route("/api/v1/health", get(health))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true),
        )
        .layer(RequestBodyLimitLayer::new(defaults::BODY_LIMIT_BYTES))
        .with_state(state)
}

/// Parse allowed CORS origins from the comma-separated `ALLOWED_ORIGINS`
/// environment variable. Invalid entries are skipped with a warning.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
