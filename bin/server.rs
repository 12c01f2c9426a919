// Subtrack - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use rusqlite::Connection;
use subtrack::api::{router, AppState};
use subtrack::{setup_database, Config};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env();

    println!("🌐 Subtrack - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open (or create) database
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    setup_database(&conn).context("initializing schema")?;
    println!("✓ Database opened: {}", config.db_path.display());

    let app = router(AppState::new(conn))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;

    tracing::info!(addr = %config.addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.addr);
    println!("   API: http://{}/api/subscriptions", config.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
