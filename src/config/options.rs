//! Runtime dialer options.
//!
//! Fixed at construction; the dialer never re-reads them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::health::checks::CheckFn;
use crate::observability::logging::{Logger, TracingLogger};
use crate::resilience::Ejection;

pub const DEFAULT_THRESHOLD: u32 = 2;
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_EJECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for [`Dialer`](crate::Dialer).
#[derive(Clone)]
pub struct Options {
    /// Consecutive failed probes before an upstream is ejected.
    pub threshold: u32,
    /// Time between two probes of the same upstream.
    pub check_interval: Duration,
    /// Upper bound for a single probe.
    pub check_timeout: Duration,
    /// Cooldown of the time-bounded ejection policy.
    pub eject_timeout: Duration,
    /// Try the next eligible upstream when a connect attempt fails.
    pub next_upstream: bool,
    /// Active health check. `None` disables probing.
    pub check: Option<CheckFn>,
    /// Explicit ejection policy. `None` derives it from `check`.
    pub ejection: Option<Ejection>,
    pub logger: Arc<dyn Logger>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn eject_timeout(mut self, timeout: Duration) -> Self {
        self.eject_timeout = timeout;
        self
    }

    pub fn next_upstream(mut self, enabled: bool) -> Self {
        self.next_upstream = enabled;
        self
    }

    pub fn check(mut self, check: CheckFn) -> Self {
        self.check = Some(check);
        self
    }

    pub fn ejection(mut self, ejection: Ejection) -> Self {
        self.ejection = Some(ejection);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// The policy the dialer will run with.
    ///
    /// Check-driven when a health check is configured, time-bounded otherwise.
    pub fn ejection_policy(&self) -> Ejection {
        match (self.ejection, &self.check) {
            (Some(ejection), _) => ejection,
            (None, Some(_)) => Ejection::CheckDriven,
            (None, None) => Ejection::TimeBounded { cooldown: self.eject_timeout },
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            check_interval: DEFAULT_CHECK_INTERVAL,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            eject_timeout: DEFAULT_EJECT_TIMEOUT,
            next_upstream: false,
            check: None,
            ejection: None,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("threshold", &self.threshold)
            .field("check_interval", &self.check_interval)
            .field("check_timeout", &self.check_timeout)
            .field("eject_timeout", &self.eject_timeout)
            .field("next_upstream", &self.next_upstream)
            .field("check", &self.check.is_some())
            .field("ejection", &self.ejection)
            .finish_non_exhaustive()
    }
}
