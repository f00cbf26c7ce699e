//! `oss-watch-server` — HTTP trigger/read surface for the OSS Watch pipelines.

use oss_watch_server::{ApiConfig, ApiServer, AppState};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::from_env().await?;
    init_tracing(&state.config.log_format);

    let config = ApiConfig::from_state(&state)?;
    let server = ApiServer::new(state, config);

    tracing::info!(addr = %server.addr(), "starting oss-watch-server");

    server.run_until(shutdown_signal()).await?;
    Ok(())
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_format == "json" {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
