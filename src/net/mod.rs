//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Dialer::connect
//!     → dial.rs (Dial trait, TcpDial over tokio)
//!
//! HTTP clients:
//!     hyper-util Client → connector.rs → Dialer::connect
//! ```

pub mod connector;
pub mod dial;

pub use connector::DialerConnector;
pub use dial::{Dial, Network, TcpDial};
