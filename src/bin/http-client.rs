use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use rrdialer::lifecycle::Shutdown;
use rrdialer::observability::logging::init_tracing;
use rrdialer::{Dialer, DialerConnector, Options};

#[derive(Parser)]
#[command(name = "rrdialer-http")]
#[command(about = "Periodic HTTP GET through the round-robin dialer", long_about = None)]
struct Cli {
    /// Request URL. Its host is ignored; the upstream comes from the rotation.
    #[arg(short, long, default_value = "http://example.com/")]
    url: String,

    /// Seconds between requests.
    #[arg(short, long, default_value_t = 1)]
    interval: u64,

    /// Upstream addresses.
    #[arg(required = true)]
    upstreams: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("rrdialer=info");
    let cli = Cli::parse();
    let uri: hyper::Uri = cli.url.parse()?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let options = Options::new().next_upstream(true);
    let dialer = Arc::new(Dialer::new(shutdown.token(), cli.upstreams, options)?);
    let connector = DialerConnector::new(dialer).with_timeout(Duration::from_secs(5));
    let client = Client::builder(TokioExecutor::new()).build::<_, Empty<Bytes>>(connector);

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.token().cancelled() => break,
        }

        let res = match client.get(uri.clone()).await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                continue;
            }
        };

        println!("Status {}", res.status());
        match res.into_body().collect().await {
            Ok(body) => println!("{}", String::from_utf8_lossy(&body.to_bytes())),
            Err(e) => tracing::warn!(error = %e, "Failed to read body"),
        }
    }

    Ok(())
}
