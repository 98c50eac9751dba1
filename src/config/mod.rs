//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DialerConfig::options()
//!     → Options (plus programmatic health check / logger)
//!     → Dialer::new
//! ```
//!
//! # Design Decisions
//! - Options are immutable once the dialer is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use options::Options;
pub use schema::{CheckKind, DialerConfig, EjectionMode, HealthCheckConfig, ListenerConfig};
