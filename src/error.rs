//! Error definitions for selection, dialing and probing.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the dialer.
#[derive(Debug, Error)]
pub enum DialError {
    /// Every upstream is currently ejected.
    #[error("all addresses are unavailable now")]
    AllUnavailable,

    /// The dial attempt against an upstream failed.
    #[error("connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The governing lifetime or the caller's token was cancelled.
    #[error("dial cancelled")]
    Cancelled,

    /// The address is not one of the configured upstreams.
    #[error("unknown upstream: {0}")]
    UnknownUpstream(String),

    /// The dialer was constructed without any upstream.
    #[error("no upstream addresses configured")]
    NoUpstreams,
}

impl DialError {
    /// Returns `true` when the pool is fully ejected.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::AllUnavailable)
    }
}

/// Result type for dialer operations.
pub type DialResult<T> = Result<T, DialError>;

/// Failure reported by a health check probe.
///
/// Absorbed by the health loop; never returned from the dialer API.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe did not complete in time.
    #[error("health check timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error while probing.
    #[error("health check I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP exchange failed.
    #[error("health check HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// HTTP probe received an error status.
    #[error("HTTP status code: {0}")]
    Status(u16),

    /// Any other probe-specific failure.
    #[error("health check failed: {0}")]
    Failed(String),
}
