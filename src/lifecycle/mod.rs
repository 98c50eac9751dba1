//! Lifecycle management.
//!
//! ```text
//! Ctrl+C → Shutdown::trigger → root token cancelled
//!     → dialer lifetimes (child tokens) cancelled
//!     → health monitors and cooldown timers exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
