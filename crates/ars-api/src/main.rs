//! # ars-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the app release server.

use std::net::SocketAddr;
use std::process::ExitCode;

use ars_api::config::AppConfig;
use clap::Parser;

/// App release server.
#[derive(Parser, Debug)]
#[command(name = "ars-api", version, about)]
struct Args {
    /// Port to listen on. Overrides `PORT`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    tracing::debug!(?config, "configuration loaded");
    let port = config.port;

    let state = ars_api::bootstrap::bootstrap(config).await?;
    let app = ars_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("ARS API listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install shutdown handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
