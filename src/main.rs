//! TCP load balancer built on the round-robin dialer.
//!
//! ```text
//! client ──▶ listener ──▶ Dialer::connect_timeout ──▶ upstream
//!            (accept)     (round robin, ejection)
//! ```
//!
//! Upstreams come from the command line or from a TOML file (`--config`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::{TcpListener, TcpStream};

use rrdialer::config::loader::load_config;
use rrdialer::config::{CheckKind, DialerConfig};
use rrdialer::lifecycle::Shutdown;
use rrdialer::observability::logging::init_tracing;
use rrdialer::{Dialer, Network};

#[derive(Parser)]
#[command(name = "rrdialer-tcplb")]
#[command(about = "Round-robin TCP load balancer with upstream health checks", long_about = None)]
struct Cli {
    /// TOML configuration file. Overrides the other flags.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address.
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    listen: String,

    /// Try the next upstream when a connect attempt fails.
    #[arg(long)]
    next_upstream: bool,

    /// Disable the TCP health check.
    #[arg(long)]
    no_check: bool,

    /// Upstream addresses.
    upstreams: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<DialerConfig, Box<dyn std::error::Error>> {
        if let Some(path) = &self.config {
            return Ok(load_config(path)?);
        }

        let mut config = DialerConfig {
            upstreams: self.upstreams,
            next_upstream: self.next_upstream,
            ..Default::default()
        };
        config.listener.bind_address = self.listen;
        if !self.no_check {
            config.health_check.kind = CheckKind::Tcp;
        }
        rrdialer::config::validation::validate_config(&config)
            .map_err(rrdialer::config::loader::ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("rrdialer=info");

    let config = Cli::parse().into_config()?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let dialer = Arc::new(Dialer::new(
        shutdown.token(),
        config.upstreams.clone(),
        config.options(),
    )?);
    let connect_timeout = Duration::from_secs(config.listener.connect_timeout_secs);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        upstreams = ?config.upstreams,
        "Listening for connections"
    );

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let dialer = Arc::clone(&dialer);
                        tokio::spawn(async move {
                            handle(stream, peer, &dialer, connect_timeout).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                }
            }
            _ = shutdown.token().cancelled() => break,
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn handle(
    mut client: TcpStream,
    peer: std::net::SocketAddr,
    dialer: &Dialer,
    timeout: Duration,
) {
    let mut upstream = match dialer.connect_timeout(Network::Tcp, timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(client = %peer, error = %e, "Upstream error");
            return;
        }
    };

    tracing::info!(
        client = %peer,
        upstream = ?upstream.peer_addr().ok(),
        "Client connected to upstream"
    );

    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::debug!(client = %peer, sent, received, "Connection closed");
        }
        Err(e) => tracing::debug!(client = %peer, error = %e, "Connection closed with error"),
    }
}
