use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use heliograph_server::{RelayConfig, RoomRegistry, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Signaling relay daemon: routes negotiation metadata between room
/// members, never media.
#[derive(Parser)]
#[command(name = "heliograph-relayd", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8090")]
    bind: SocketAddr,

    /// Member liveness probe interval, in seconds.
    #[arg(long, default_value_t = 30)]
    heartbeat_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let registry = RoomRegistry::new(RelayConfig {
        heartbeat_interval: Duration::from_secs(args.heartbeat_interval),
    });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "relay listening");

    axum::serve(listener, router(registry))
        .await
        .context("relay server exited")?;

    Ok(())
}
