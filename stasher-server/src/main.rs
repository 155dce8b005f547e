// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Stasher demo server
//
//  Small axum app with every route wrapped in the event logger.
//  Diagnostics go through tracing (stderr); events go to the
//  configured sink (stdout by default), one JSON line per request.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use stasher_core::config::StasherConfig;
use stasher_middleware::EventLoggerLayer;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stasher", version, about = "Logstash-style request logging demo server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stasher.yaml")]
    config: PathBuf,

    /// Log level for diagnostics
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    // Diagnostics on stderr so they never mix with events on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        StasherConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        StasherConfig::default()
    };

    // ── Sink + app ──
    let sink = stasher_sink::open_sink(&config.sink)?;
    info!(kind = ?config.sink.kind, schema = ?config.event.schema, "Event sink ready");

    let app = build_app(EventLoggerLayer::new(sink).with_config(config.event.clone()));

    let listener = tokio::net::TcpListener::bind(&cli.addr).await?;
    info!(addr = %cli.addr, "Stasher demo server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stasher demo server stopped");
    Ok(())
}

fn build_app(logger: EventLoggerLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hello/{name}", get(hello))
        .fallback(not_found)
        .layer(logger)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn hello(Path(name): Path<String>) -> String {
    format!("hello, {name}")
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
