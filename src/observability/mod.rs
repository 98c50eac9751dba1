//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Latch trip / reset, connect fallback:
//!     → logging.rs (DialEvent → injected Logger, tracing by default)
//!     → metrics.rs (gauges and counters per upstream)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{DialEvent, Logger, NoopLogger, TracingLogger};
