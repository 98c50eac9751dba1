//! Configuration schema definitions.
//!
//! The file form of [`Options`]. All types derive Serde traits for
//! deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::options::{Options, DEFAULT_THRESHOLD};
use crate::health::checks::{http_check, tcp_check};
use crate::resilience::Ejection;

/// Root configuration for a dialer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialerConfig {
    /// Upstream addresses in rotation order (e.g., "127.0.0.1:5000").
    pub upstreams: Vec<String>,

    /// Try the next upstream when a connect attempt fails.
    pub next_upstream: bool,

    /// Cooldown for time-bounded ejection, in seconds.
    pub eject_timeout_secs: u64,

    /// Ejection policy.
    pub ejection: EjectionMode,

    /// Active health check settings.
    pub health_check: HealthCheckConfig,

    /// Listener settings for the TCP load balancer binary.
    pub listener: ListenerConfig,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            upstreams: Vec::new(),
            next_upstream: false,
            eject_timeout_secs: 10,
            ejection: EjectionMode::Auto,
            health_check: HealthCheckConfig::default(),
            listener: ListenerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EjectionMode {
    /// Check-driven with a health check, time-bounded without.
    #[default]
    Auto,
    TimeBounded,
    CheckDriven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    #[default]
    None,
    Tcp,
    Http,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe type.
    pub kind: CheckKind,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds.
    pub timeout_secs: u64,

    /// Number of consecutive failures before ejecting.
    pub threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            kind: CheckKind::None,
            path: "/".to_string(),
            interval_secs: 5,
            timeout_secs: 5,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8888").
    pub bind_address: String,

    /// Per-attempt upstream connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
            connect_timeout_secs: 1,
        }
    }
}

impl DialerConfig {
    /// Build runtime options. The logger stays at its default.
    pub fn options(&self) -> Options {
        let eject_timeout = Duration::from_secs(self.eject_timeout_secs);
        let mut options = Options::new()
            .threshold(self.health_check.threshold)
            .check_interval(Duration::from_secs(self.health_check.interval_secs))
            .check_timeout(Duration::from_secs(self.health_check.timeout_secs))
            .eject_timeout(eject_timeout)
            .next_upstream(self.next_upstream);

        match self.health_check.kind {
            CheckKind::None => {}
            CheckKind::Tcp => options = options.check(tcp_check()),
            CheckKind::Http => options = options.check(http_check(self.health_check.path.clone())),
        }

        match self.ejection {
            EjectionMode::Auto => options,
            EjectionMode::TimeBounded => {
                options.ejection(Ejection::TimeBounded { cooldown: eject_timeout })
            }
            EjectionMode::CheckDriven => options.ejection(Ejection::CheckDriven),
        }
    }
}
