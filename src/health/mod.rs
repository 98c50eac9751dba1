//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs), one task per upstream:
//!     Interval tick
//!     → checks.rs probe (bounded by timeout)
//!     → Upstream::record_probe
//!     → latch trip / reset
//!
//! State (state.rs):
//!     Healthy ↔ Degraded → Ejected → Healthy
//! ```
//!
//! # Design Decisions
//! - The probe is pluggable; TCP and HTTP probes are provided
//! - The failure count has a single writer: the upstream's own loop
//! - Cancellation never counts as a failed probe

pub mod active;
pub mod checks;
pub mod state;

pub use checks::{check_fn, http_check, tcp_check, CheckFn};
pub use state::HealthState;
