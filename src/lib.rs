//! Client-side round-robin dialer with upstream health tracking.
//!
//! A [`Dialer`] owns a fixed list of upstream addresses. Each call selects the
//! next eligible one in round-robin order, skipping upstreams that are
//! currently ejected. Upstreams are ejected either by an active health check
//! reaching its failure threshold, or, without a health check, for a cooldown
//! after a failed connect.
//!
//! ```no_run
//! use rrdialer::{Dialer, Network, Options};
//! use rrdialer::health::tcp_check;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), rrdialer::DialError> {
//! let cancel = CancellationToken::new();
//! let options = Options::new().check(tcp_check()).next_upstream(true);
//! let dialer = Dialer::new(&cancel, ["127.0.0.1:5000", "127.0.0.1:5001"], options)?;
//!
//! let stream = dialer.connect(Network::Tcp).await?;
//! # drop(stream);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::Options;
pub use error::{DialError, DialResult, ProbeError};
pub use load_balancer::{Dialer, Upstream, UpstreamStatus};
pub use net::{Dial, DialerConnector, Network, TcpDial};
pub use resilience::Ejection;
