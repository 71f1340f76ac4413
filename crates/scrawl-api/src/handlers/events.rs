//! Change-notification stream (SSE).

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tracing::info;

use scrawl_core::defaults;

use crate::origin::origin_from;
use crate::AppState;

/// `GET /api/v1/events` — long-lived notification stream.
///
/// Registers the caller's origin in the hub; the subscription unregisters
/// itself when the connection drops (the stream is dropped with it), or ends
/// early if the registry evicts it.
pub async fn subscribe_events(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let origin = origin_from(&headers, peer);
    info!(
        subsystem = "api",
        component = "events",
        origin = %origin,
        live = state.hub.subscriber_count() + 1,
        "Notification subscriber connected"
    );

    let stream = state.hub.subscribe(origin).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(defaults::SSE_EVENT_LABEL).data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(defaults::SSE_KEEPALIVE_SECS))
            .text("keepalive"),
    )
}
