use crate::{
    app::{
        cli::Cli,
        server::{ServerOptions, start_server},
    },
    render::{GdalReader, RenderWorkerPool},
};
use dotenvy::dotenv;
use std::{sync::Arc, time::Duration};
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub(crate) fn start() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracy_client::Client::start();

    let cli = Cli::parse_checked();

    let resolver_config = match cli.resolver_config() {
        Ok(config) => config,
        Err(err) => panic!("invalid mosaic defaults: {err}"),
    };

    info!("Starting {} render workers", cli.worker_count);

    let render_worker_pool = Arc::new(
        RenderWorkerPool::new(cli.worker_count, GdalReader::new).expect("spawn render workers"),
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio");

    let (shutdown_tx, _) = broadcast::channel(1);

    rt.spawn(shutdown_signal(shutdown_tx.clone()));

    if let Err(err) = rt.block_on(start_server(
        render_worker_pool.clone(),
        shutdown_tx.subscribe(),
        ServerOptions {
            host: cli.host,
            port: cli.port,
            max_concurrent_connections: cli.max_concurrent_connections,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            cors: cli.cors,
            url_prefix: cli.url_prefix,
            public_url: cli.public_url,
            allowed_scales: cli.allowed_scales,
            resolver_config,
        },
    )) {
        error!("Server stopped with error: {err}");
    }

    info!("Stopping render worker pool.");
    render_worker_pool.shutdown();
    info!("Render worker pool stopped.");
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = unix_signal(SignalKind::terminate()).expect("install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");

    if let Err(err) = shutdown_tx.send(()) {
        error!("Error sending shutdown signal: {err}");
    }
}
