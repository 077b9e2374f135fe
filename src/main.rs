mod aws;
mod cloud;
mod config;
mod error;
mod logging;
mod models;
mod query;
mod routes;

#[cfg(not(unix))]
use std::future;

use cloud::CloudClients;
use config::Config;
use tokio::{net::TcpListener, signal};
use tracing::info;

use crate::{config::load_config, routes::router};

#[derive(Clone)]
struct AppContext {
    config: Config,
    clients: CloudClients,
}

async fn start_api(config: Config, clients: CloudClients) -> anyhow::Result<()> {
    let ctx = AppContext { config: config.clone(), clients };

    let listener = TcpListener::bind(&config.api.bind).await?;
    info!("api is running on http://{}", config.api.bind);
    info!("serving static files from {}", config.api.static_dir.display());
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().await?;
    logging::init_logger(&config.logging)?;

    info!("loading aws profile {:?}", config.aws.profile);
    let clients = aws::cloud_clients(&config.aws).await;

    start_api(config, clients).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down");
}
