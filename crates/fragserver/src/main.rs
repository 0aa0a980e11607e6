use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fragconf::{FragmentsConfig, StorageBackend};
use fragserver::{storage, telemetry, web};

/// The fragments HTTP server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file, replacing ./fragments.toml in the load order
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage backend: memory or file (overrides config)
    #[arg(long)]
    storage: Option<StorageBackend>,

    /// Directory for the file backend (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = FragmentsConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.bind.http_port = port;
    }
    if let Some(backend) = cli.storage {
        config.storage.backend = backend;
    }
    if let Some(dir) = cli.data_dir {
        config.paths.data_dir = dir;
    }

    telemetry::init(&config.telemetry.log_level).context("Failed to initialize tracing")?;

    for file in &sources.files {
        tracing::info!("Loaded config: {}", file.display());
    }
    if !sources.env_overrides.is_empty() {
        tracing::info!("Env overrides: {}", sources.env_overrides.join(", "));
    }

    let repo = storage::open_repository(&config).await?;

    let state = web::WebState {
        repo,
        max_body_bytes: config.storage.max_body_bytes,
    };
    let app = web::router(state);

    let addr: SocketAddr = config
        .bind
        .socket_addr()
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Fragments server starting on http://{}", addr);
    tracing::info!("   Health: GET http://{}/", addr);
    tracing::info!("   Fragments: http://{}/v1/fragments", addr);
    tracing::info!("   Storage: {}", config.storage.backend);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully..."),
    }
}
