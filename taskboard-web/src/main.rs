//! # Taskboard Web Server
//!
//! Serves the Taskboard dashboard, login page and JSON API.
//!
//! ## Usage
//!
//! ```bash
//! SUPABASE_PROJECT_URL=https://xyz.supabase.co SUPABASE_API_KEY=... cargo run -p taskboard-web
//! TASKBOARD_OFFLINE=true cargo run -p taskboard-web
//! ```

use std::sync::Arc;
use std::time::Duration;
use taskboard_web::{
    app::{build_router, AppState},
    config::Config,
    session::ClientRegistry,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; LOG_FORMAT=json switches to structured output
    let json_logs = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskboard_web=debug,taskboard_shared=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        "Taskboard Web Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let addr = config.bind_address();

    if matches!(config.backend, taskboard_web::config::BackendConfig::Offline) {
        tracing::warn!("Running offline: tables and accounts live in memory only");
    }

    let state = AppState::from_config(config);
    tokio::spawn(evict_idle_clients(state.clients.clone()));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Drops data clients of sessions that went idle without a logout
async fn evict_idle_clients(clients: Arc<ClientRegistry>) {
    let period = (clients.idle_timeout() / 4).max(Duration::from_secs(60));
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;
        let evicted = clients.evict_idle().await;
        if evicted > 0 {
            tracing::info!(evicted, "idle data clients evicted");
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
