//! scrawl-api - HTTP server binary for the scrawl shared notepad.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrawl_api::services::ChatService;
use scrawl_api::{router, AppState, AuthConfig};
use scrawl_core::{defaults, NoteEditor, NotifyHub};
use scrawl_db::Database;
use scrawl_inference::{ChatBackend, OpenAIBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "scrawl_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scrawl_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("scrawl-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
        None
    };

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults::PORT);
    let quiet_period_ms: u64 = std::env::var("QUIET_PERIOD_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults::QUIET_PERIOD_MS);
    let max_subscribers: usize = std::env::var("MAX_SUBSCRIBERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults::MAX_SUBSCRIBERS);

    let password = std::env::var("SCRAWL_PASSWORD")
        .context("SCRAWL_PASSWORD must be set")?;
    // A fixed token survives restarts when configured; otherwise sessions
    // last until the process does.
    let token = std::env::var("SCRAWL_TOKEN")
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

    // Connect to database and apply schema
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    info!("Database ready");

    // Load the note into the editor; history starts at the stored content
    let editor = Arc::new(
        NoteEditor::load(
            Arc::new(db.notes.clone()),
            Duration::from_millis(quiet_period_ms),
        )
        .await?,
    );
    info!(
        quiet_period_ms,
        versions = editor.history_depth(),
        "Note editor ready"
    );

    // Notification hub
    let hub = Arc::new(NotifyHub::new(max_subscribers));
    info!(capacity = hub.capacity(), "Notification hub ready");

    // Model backend; unreachable is a warning, not a startup failure — the
    // notepad works without the chat panel.
    let backend = Arc::new(OpenAIBackend::from_env()?);
    match backend.health_check().await {
        Ok(true) => info!("Completion backend reachable"),
        _ => warn!("Completion backend unreachable; chat exchanges will fail"),
    }

    let state = AppState {
        chat: ChatService::new(Arc::new(db.chats.clone()), backend),
        db,
        editor: Arc::clone(&editor),
        hub,
        auth: Arc::new(AuthConfig { password, token }),
    };

    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Bound the durability lag at exit: persist whatever the debounce timer
    // still owed.
    info!("Shutting down");
    editor.flush().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
