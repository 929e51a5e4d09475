//! pagechat - multi-page webhook chat
//!
//! An HTTP server hosting a multi-page chat client: each page's messages
//! are persisted to SQLite and relayed to that page's configured webhook,
//! whose JSON reply becomes the bot message.

mod api;
mod composer;
mod config;
mod db;
mod engine;
mod relay;

use api::{create_router, AppState};
use config::Pages;
use db::Database;
use engine::{ConversationEngine, DatabaseStore};
use relay::WebhookClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagechat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("PAGECHAT_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.pagechat/pagechat.db")
    });

    let port: u16 = std::env::var("PAGECHAT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %db_path, "Opening database");
    let db = Database::open(&db_path)?;

    // Static page configuration, fixed for the lifetime of the process
    let pages = Pages::from_env();
    tracing::info!(count = pages.all().len(), "Pages configured");

    let engine = ConversationEngine::new(DatabaseStore::new(db), WebhookClient::new());
    let state = AppState::new(engine, pages);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("pagechat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
