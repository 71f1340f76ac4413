//! Chat transcript handlers and the WebSocket completion stream.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use scrawl_core::{ChatSummary, ChatTranscript};

use crate::AppState;

use super::ApiError;

#[derive(Debug, Serialize)]
pub struct CreateChatResponse {
    pub id: i64,
}

/// `GET /api/v1/chats` — transcript listing, newest first.
pub async fn list_chats(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    Ok(Json(state.chat.list().await?))
}

/// `POST /api/v1/chats` — start a new conversation.
pub async fn create_chat(
    State(state): State<AppState>,
) -> Result<Json<CreateChatResponse>, ApiError> {
    let id = state.chat.create().await?;
    Ok(Json(CreateChatResponse { id }))
}

/// `GET /api/v1/chats/:id` — full transcript.
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ChatTranscript>, ApiError> {
    Ok(Json(state.chat.fetch(id).await?))
}

/// One exchange request sent by the client over the socket.
#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub chat_id: i64,
    pub message: String,
}

/// Frames pushed back while an exchange runs.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CompletionFrame {
    /// Partial model output, in arrival order.
    Token { content: String },
    /// The exchange finished; `content` is the full reply.
    Done { content: String },
    /// The exchange failed before completing.
    Error { message: String },
}

/// `GET /api/v1/chats/ws` — WebSocket endpoint for streamed exchanges.
pub async fn chat_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_completion_socket(socket, state))
}

async fn handle_completion_socket(mut socket: WebSocket, state: AppState) {
    info!(subsystem = "api", component = "chat", "Completion socket opened");

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                let request: CompletionRequest = match serde_json::from_str(&text) {
                    Ok(request) => request,
                    Err(error) => {
                        let _ = send_frame(
                            &mut socket,
                            &CompletionFrame::Error {
                                message: format!("Malformed request: {}", error),
                            },
                        )
                        .await;
                        continue;
                    }
                };
                run_exchange(&mut socket, &state, request).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(subsystem = "api", component = "chat", "Completion socket closed");
}

/// Stream one exchange to the socket, then persist it.
///
/// If the socket dies mid-stream we stop sending but keep draining the model
/// output so the completed exchange is still recorded; the upstream call
/// itself is not cancelled.
async fn run_exchange(socket: &mut WebSocket, state: &AppState, request: CompletionRequest) {
    let mut stream = match state.chat.open_stream(request.chat_id, &request.message).await {
        Ok(stream) => stream,
        Err(error) => {
            warn!(
                subsystem = "api",
                component = "chat",
                chat_id = request.chat_id,
                error = %error,
                "Failed to open completion stream"
            );
            let _ = send_frame(
                socket,
                &CompletionFrame::Error {
                    message: error.to_string(),
                },
            )
            .await;
            return;
        }
    };

    let mut reply = String::new();
    let mut sink_alive = true;
    while let Some(token) = stream.next().await {
        match token {
            Ok(token) => {
                reply.push_str(&token);
                if sink_alive {
                    let frame = CompletionFrame::Token { content: token };
                    if send_frame(socket, &frame).await.is_err() {
                        debug!(
                            subsystem = "api",
                            component = "chat",
                            chat_id = request.chat_id,
                            "Socket gone mid-stream, draining remaining tokens"
                        );
                        sink_alive = false;
                    }
                }
            }
            Err(error) => {
                warn!(
                    subsystem = "api",
                    component = "chat",
                    chat_id = request.chat_id,
                    error = %error,
                    "Completion stream failed"
                );
                if sink_alive {
                    let _ = send_frame(
                        socket,
                        &CompletionFrame::Error {
                            message: error.to_string(),
                        },
                    )
                    .await;
                }
                return;
            }
        }
    }

    if let Err(error) = state
        .chat
        .finish_exchange(request.chat_id, request.message, reply.clone())
        .await
    {
        warn!(
            subsystem = "api",
            component = "chat",
            error = %error,
            "Failed to persist completed exchange"
        );
    }

    if sink_alive {
        let _ = send_frame(socket, &CompletionFrame::Done { content: reply }).await;
    }
}

async fn send_frame(
    socket: &mut WebSocket,
    frame: &CompletionFrame,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(json)).await
}
