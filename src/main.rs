use anyhow::Context;

use doppel::api::{self, AppState};
use doppel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    eprintln!("Doppel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   API: http://{}/api", config.server.bind_addr());

    // ── LLM + database ───────────────────────────────────────────────────
    let state = AppState::from_config(&config).await.with_context(|| {
        format!(
            "failed to start with database at {}",
            config.server.db_path.display()
        )
    })?;
    eprintln!("   Database: {}", config.server.db_path.display());

    // ── HTTP ─────────────────────────────────────────────────────────────
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr()))?;
    tracing::info!(port = config.server.port, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
