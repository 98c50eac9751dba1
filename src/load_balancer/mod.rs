//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dialer::pick / pick_all
//!     → round_robin.rs (advance shared cursor, skip ejected upstreams)
//!     → upstream.rs (latch state per address)
//! Dialer::connect
//!     → dial each candidate in rotation order
//!     → on failure: report to the upstream, fall back if enabled
//! ```
//!
//! # Design Decisions
//! - Upstream list is fixed for the dialer's lifetime, indexed by position
//! - Selection is lock-free: one atomic increment plus latch reads
//! - Selection does no I/O, so it is testable without a network

pub mod dialer;
pub mod round_robin;
pub mod upstream;

pub use dialer::Dialer;
pub use upstream::{Upstream, UpstreamStatus};
