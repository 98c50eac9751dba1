//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connect failure (time-bounded policy) or health check threshold:
//!     → circuit_breaker.rs (trip the upstream's latch)
//!     → round robin selection skips the upstream
//!     → cooldown timer or successful probe resets the latch
//! ```

pub mod circuit_breaker;

pub use circuit_breaker::{Ejection, Locker};
