//! Dial event logging.
//!
//! # Responsibilities
//! - Describe every latch transition, fallback and final connect failure as a typed event
//! - Deliver events to an injected [`Logger`]
//! - Initialize the tracing subscriber for the binaries
//!
//! # Design Decisions
//! - Latch events are emitted only on state transitions, never for steady-state failures
//! - The default logger forwards to `tracing`; without a subscriber it is silent
//! - `NoopLogger` stands in when no output is wanted at all

use std::fmt;
use std::io;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A diagnostic event produced by the dialer or a health loop.
#[derive(Debug)]
pub enum DialEvent<'a> {
    /// An upstream was removed from rotation.
    Ejected {
        address: &'a str,
        reason: &'a str,
        /// Set when the upstream comes back automatically.
        cooldown: Option<Duration>,
    },
    /// An ejected or failing upstream is eligible and healthy again.
    Recovered { address: &'a str },
    /// A connect attempt failed and the next upstream will be tried.
    Fallback { address: &'a str, error: &'a io::Error },
    /// A connect attempt failed and its error goes back to the caller.
    ConnectFailed { address: &'a str, error: &'a io::Error },
}

impl DialEvent<'_> {
    pub fn address(&self) -> &str {
        match self {
            Self::Ejected { address, .. }
            | Self::Recovered { address }
            | Self::Fallback { address, .. }
            | Self::ConnectFailed { address, .. } => address,
        }
    }
}

impl fmt::Display for DialEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ejected { address, reason, cooldown: Some(cooldown) } => {
                write!(f, "{}: {} ejected for {:?}", reason, address, cooldown)
            }
            Self::Ejected { address, reason, cooldown: None } => {
                write!(f, "{}: {} ejected until it passes a health check", reason, address)
            }
            Self::Recovered { address } => write!(f, "{} recovered", address),
            Self::Fallback { address, error } => {
                write!(f, "{}: {} failed, trying next upstream", error, address)
            }
            Self::ConnectFailed { address, error } => write!(f, "{}: {} failed", error, address),
        }
    }
}

/// Sink for dial events.
pub trait Logger: Send + Sync {
    fn log(&self, event: &DialEvent<'_>);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, event: &DialEvent<'_>) {
        match event {
            DialEvent::Ejected { address, reason, cooldown } => {
                tracing::warn!(
                    upstream = %address,
                    reason = %reason,
                    cooldown = ?cooldown,
                    "Upstream ejected"
                );
            }
            DialEvent::Recovered { address } => {
                tracing::info!(upstream = %address, "Upstream recovered");
            }
            DialEvent::Fallback { address, error } => {
                tracing::warn!(
                    upstream = %address,
                    error = %error,
                    "Connect failed, trying next upstream"
                );
            }
            DialEvent::ConnectFailed { address, error } => {
                tracing::warn!(upstream = %address, error = %error, "Connect failed");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _event: &DialEvent<'_>) {}
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
