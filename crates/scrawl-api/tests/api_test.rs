//! End-to-end tests driving the full server over real sockets: auth gate,
//! note editing, origin-aware SSE fan-out, and the WebSocket chat stream.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use scrawl_api::services::ChatService;
use scrawl_api::{router, AppState, AuthConfig};
use scrawl_core::{ChatStore, NoteEditor, NoteStore, NotifyHub};
use scrawl_db::Database;
use scrawl_inference::MockChatBackend;

const PASSWORD: &str = "letmein";
const TOKEN: &str = "fixed-test-token";

/// Short quiet period so commit-dependent tests settle quickly.
const QUIET_MS: u64 = 100;

struct TestServer {
    addr: SocketAddr,
    db: Database,
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Authenticated client with a distinct User-Agent (one "browser").
    fn client(&self, user_agent: &str) -> reqwest::Client {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", TOKEN).parse().unwrap(),
        );
        reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .unwrap()
    }
}

async fn spawn_server(backend: MockChatBackend) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("api.db").display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();

    let editor = Arc::new(
        NoteEditor::load(
            Arc::new(db.notes.clone()),
            Duration::from_millis(QUIET_MS),
        )
        .await
        .unwrap(),
    );
    let state = AppState {
        chat: ChatService::new(Arc::new(db.chats.clone()), Arc::new(backend)),
        db: db.clone(),
        editor,
        hub: Arc::new(NotifyHub::new(50)),
        auth: Arc::new(AuthConfig {
            password: PASSWORD.to_string(),
            token: TOKEN.to_string(),
        }),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestServer {
        addr,
        db,
        _dir: dir,
    }
}

/// Read SSE frames until the next `data:` line.
async fn next_sse_data(
    stream: &mut (impl futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin),
    buffer: &mut String,
) -> String {
    loop {
        if let Some(position) = buffer.find("data: ") {
            if let Some(end) = buffer[position..].find('\n') {
                let data = buffer[position + 6..position + end].trim().to_string();
                buffer.drain(..position + end);
                return data;
            }
        }
        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for SSE data")
            .expect("SSE stream ended")
            .expect("SSE stream errored");
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

#[tokio::test]
async fn health_is_open_but_note_routes_are_gated() {
    let server = spawn_server(MockChatBackend::new()).await;
    let anonymous = reqwest::Client::new();

    let health = anonymous
        .get(server.url("/api/v1/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);

    let gated = anonymous
        .get(server.url("/api/v1/note"))
        .send()
        .await
        .unwrap();
    assert_eq!(gated.status(), 401);
}

#[tokio::test]
async fn login_issues_the_token_and_cookie_works() {
    let server = spawn_server(MockChatBackend::new()).await;
    let anonymous = reqwest::Client::new();

    let rejected = anonymous
        .post(server.url("/auth"))
        .json(&serde_json::json!({"password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 401);

    let accepted = anonymous
        .post(server.url("/auth"))
        .json(&serde_json::json!({"password": PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
    let set_cookie = accepted
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains(&format!("scrawl_token={}", TOKEN)));
    let body: serde_json::Value = accepted.json().await.unwrap();
    assert_eq!(body["token"], TOKEN);

    // Cookie-based access to a guarded route.
    let via_cookie = anonymous
        .get(server.url("/api/v1/note/text"))
        .header(
            reqwest::header::COOKIE,
            format!("scrawl_token={}", TOKEN),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(via_cookie.status(), 200);
}

#[tokio::test]
async fn edits_are_readable_immediately_and_rollback_restores() {
    let server = spawn_server(MockChatBackend::new()).await;
    let client = server.client("editor-agent");

    for text in ["alpha", "beta"] {
        let response = client
            .post(server.url("/api/v1/note/edit"))
            .json(&serde_json::json!({"text": text}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        // Same-process reads see the edit before any persist happens.
        let current = client
            .get(server.url("/api/v1/note/text"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(current, text);

        // Let the quiet period elapse so the write commits to history.
        tokio::time::sleep(Duration::from_millis(QUIET_MS * 3)).await;
    }

    assert_eq!(server.db.notes.read_note().await.unwrap(), "beta");

    let rollback: serde_json::Value = client
        .post(server.url("/api/v1/note/rollback"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rollback["status"], "ok");
    assert_eq!(rollback["content"], "alpha");

    let current = client
        .get(server.url("/api/v1/note/text"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(current, "alpha");
}

#[tokio::test]
async fn prepend_prefixes_with_a_blank_line() {
    let server = spawn_server(MockChatBackend::new()).await;
    let client = server.client("editor-agent");

    client
        .post(server.url("/api/v1/note/edit"))
        .json(&serde_json::json!({"text": "base"}))
        .send()
        .await
        .unwrap();
    client
        .post(server.url("/api/v1/note/prepend"))
        .json(&serde_json::json!({"text": "captured"}))
        .send()
        .await
        .unwrap();

    let current = client
        .get(server.url("/api/v1/note/text"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(current, "captured\n\nbase");
}

#[tokio::test]
async fn sse_notifies_other_origins_but_not_the_editor() {
    let server = spawn_server(MockChatBackend::new()).await;
    let editor = server.client("editor-agent");
    let viewer = server.client("viewer-agent");

    let mut editor_events = Box::pin(
        editor
            .get(server.url("/api/v1/events"))
            .send()
            .await
            .unwrap()
            .bytes_stream(),
    );
    let mut viewer_events = Box::pin(
        viewer
            .get(server.url("/api/v1/events"))
            .send()
            .await
            .unwrap()
            .bytes_stream(),
    );
    let mut editor_buffer = String::new();
    let mut viewer_buffer = String::new();

    // Edit from the editor origin: only the viewer refreshes.
    editor
        .post(server.url("/api/v1/note/edit"))
        .json(&serde_json::json!({"text": "from editor"}))
        .send()
        .await
        .unwrap();
    let seen = next_sse_data(&mut viewer_events, &mut viewer_buffer).await;
    assert!(seen.contains("editor-agent"));

    // Edit from the viewer origin: now the editor's stream gets its first
    // event, and it carries the viewer's origin — proving the earlier
    // same-origin event was suppressed, not delayed.
    viewer
        .post(server.url("/api/v1/note/edit"))
        .json(&serde_json::json!({"text": "from viewer"}))
        .send()
        .await
        .unwrap();
    let first_for_editor = next_sse_data(&mut editor_events, &mut editor_buffer).await;
    assert!(first_for_editor.contains("viewer-agent"));
}

#[tokio::test]
async fn chat_crud_round_trip() {
    let server = spawn_server(MockChatBackend::new()).await;
    let client = server.client("chat-agent");

    let created: serde_json::Value = client
        .post(server.url("/api/v1/chats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let listed: serde_json::Value = client
        .get(server.url("/api/v1/chats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["id"].as_i64().unwrap(), id);
    assert_eq!(listed[0]["title"], "New Chat");

    let fetched: serde_json::Value = client
        .get(server.url(&format!("/api/v1/chats/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 0);

    let missing = client
        .get(server.url("/api/v1/chats/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn websocket_exchange_streams_tokens_and_persists() {
    let backend = MockChatBackend::new()
        .with_reply("mock says hi")
        .with_title("Mock Title")
        .with_chunk_len(4);
    let server = spawn_server(backend).await;
    let client = server.client("chat-agent");

    let created: serde_json::Value = client
        .post(server.url("/api/v1/chats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let mut request = format!("ws://{}/api/v1/chats/ws", server.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "cookie",
        format!("scrawl_token={}", TOKEN).parse().unwrap(),
    );
    let (mut socket, _) = tokio_tungstenite::connect_async(request).await.unwrap();

    socket
        .send(WsMessage::Text(
            serde_json::json!({"chat_id": id, "message": "hello"}).to_string(),
        ))
        .await
        .unwrap();

    let mut streamed = String::new();
    let mut tokens = 0;
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed early")
            .expect("socket errored");
        let WsMessage::Text(text) = message else {
            continue;
        };
        let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
        match frame["type"].as_str() {
            Some("token") => {
                streamed.push_str(frame["content"].as_str().unwrap());
                tokens += 1;
            }
            Some("done") => {
                assert_eq!(frame["content"], "mock says hi");
                break;
            }
            other => panic!("unexpected frame type: {:?}", other),
        }
    }
    assert_eq!(streamed, "mock says hi");
    assert!(tokens > 1);

    let transcript = server.db.chats.fetch(id).await.unwrap();
    assert_eq!(transcript.messages.len(), 2);
    assert_eq!(transcript.messages[0].content, "hello");
    assert_eq!(transcript.messages[1].content, "mock says hi");
    assert_eq!(transcript.title, "Mock Title");
}

#[tokio::test]
async fn websocket_reports_unknown_chat() {
    let server = spawn_server(MockChatBackend::new()).await;

    let mut request = format!("ws://{}/api/v1/chats/ws", server.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "cookie",
        format!("scrawl_token={}", TOKEN).parse().unwrap(),
    );
    let (mut socket, _) = tokio_tungstenite::connect_async(request).await.unwrap();

    socket
        .send(WsMessage::Text(
            serde_json::json!({"chat_id": 12345, "message": "hi"}).to_string(),
        ))
        .await
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let WsMessage::Text(text) = message else {
        panic!("expected a text frame");
    };
    let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(frame["type"], "error");
    assert!(frame["message"].as_str().unwrap().contains("12345"));
}
