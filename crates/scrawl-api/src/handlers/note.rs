//! Shared-note handlers: read, edit, prepend, rollback.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::origin::origin_from;
use crate::AppState;

use super::{Ack, ApiError};

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub status: &'static str,
    pub content: String,
}

/// `GET /api/v1/note` — freshest durable view; skips the storage read while
/// a write is pending.
pub async fn read_note(State(state): State<AppState>) -> Result<Json<NoteResponse>, ApiError> {
    let content = state.editor.refreshed().await?;
    Ok(Json(NoteResponse { content }))
}

/// `GET /api/v1/note/text` — the raw in-memory content.
pub async fn note_text(State(state): State<AppState>) -> String {
    state.editor.current()
}

/// `POST /api/v1/note/edit` — apply an edit and notify every other origin.
pub async fn edit_note(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<EditRequest>,
) -> Json<Ack> {
    let origin = origin_from(&headers, peer);
    debug!(
        subsystem = "api",
        op = "edit",
        origin = %origin,
        content_len = body.text.len(),
        "Applying edit"
    );
    state.editor.edit(body.text);
    state.hub.publish(&origin);
    Ack::ok()
}

/// `POST /api/v1/note/prepend` — prefix a block onto the note.
///
/// Used by capture automations; does not publish a change event.
pub async fn prepend_note(
    State(state): State<AppState>,
    Json(body): Json<EditRequest>,
) -> Json<Ack> {
    state.editor.prepend(&body.text);
    Ack::ok()
}

/// `POST /api/v1/note/rollback` — restore the previous committed version.
pub async fn rollback_note(State(state): State<AppState>) -> Json<RollbackResponse> {
    let content = state.editor.rollback();
    info!(
        subsystem = "api",
        op = "rollback",
        versions = state.editor.history_depth(),
        "Rolled back note"
    );
    Json(RollbackResponse {
        status: "ok",
        content,
    })
}
