//! Mobile order server
//!
//! JSON API for ordering and the kitchen screen, plus the server-rendered menu pages.

use axum::Router;
use clap::Parser;
use mobileorder_database::Database;
use tracing::{info, instrument, warn};

mod auth;
mod config;
mod rate_limiter;
mod routes;
mod services;
mod state;
mod templates;
mod validation;

use config::Config;
use state::AppState;

/// Mobile order server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to bind to (defaults to 0.0.0.0 on the configured port)
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,server=debug".into());

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    // Parse CLI args
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let addr = args
        .addr
        .unwrap_or_else(|| format!("0.0.0.0:{}", config.port));
    info!(addr = %addr, "Starting mobile order server");

    // Open database and apply migrations
    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;

    let static_dir = config.static_dir.clone();
    let state = AppState::new(config, &database);

    // Start scheduler
    info!("Starting scheduler");
    state.start_scheduler().await?;

    // Build Axum router
    let app = Router::new()
        .merge(routes::api::routes())
        .merge(routes::ui::ui_routes(&static_dir))
        .with_state(state.clone())
        // Add middleware
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        )
        .layer(tower_http::compression::CompressionLayer::new())
        .layer(tower_http::cors::CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    state.shutdown().await;
    database.close().await?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
