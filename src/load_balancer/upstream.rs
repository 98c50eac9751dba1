//! Upstream record.
//!
//! # Responsibilities
//! - Represent a single upstream address
//! - Own its ejection latch and consecutive-failure count
//! - Interpret probe results and connect failures according to the ejection policy
//!
//! # State Machine
//! ```text
//! Healthy(failed=0) → Degraded(0 < failed < threshold) → Ejected(failed >= threshold)
//! Ejected → Healthy: successful probe (CheckDriven) or cooldown expiry (TimeBounded)
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::health::state::HealthState;
use crate::observability::logging::{DialEvent, Logger};
use crate::observability::metrics;
use crate::resilience::{Ejection, Locker};

/// A single upstream in the rotation.
pub struct Upstream {
    address: String,
    locker: Arc<Locker>,
    /// Written only by this upstream's health loop.
    failures: AtomicU32,
    /// Set by the cooldown timer; the health loop clears `failures` on its next check.
    cooled_down: Arc<AtomicBool>,
    policy: Ejection,
    threshold: u32,
    logger: Arc<dyn Logger>,
    lifetime: CancellationToken,
}

impl Upstream {
    pub(crate) fn new(
        address: String,
        policy: Ejection,
        threshold: u32,
        logger: Arc<dyn Logger>,
        lifetime: CancellationToken,
    ) -> Self {
        metrics::record_upstream_ejected(&address, false);
        Self {
            address,
            locker: Arc::new(Locker::new()),
            failures: AtomicU32::new(0),
            cooled_down: Arc::new(AtomicBool::new(false)),
            policy,
            threshold: threshold.max(1),
            logger,
            lifetime,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn policy(&self) -> Ejection {
        self.policy
    }

    /// Returns `true` while the upstream is out of rotation.
    pub fn is_ejected(&self) -> bool {
        self.locker.is_open()
    }

    /// Consecutive failed probes.
    ///
    /// Reads as zero once a cooldown has expired, even before the health loop
    /// has cleared the counter.
    pub fn failures(&self) -> u32 {
        if self.cooled_down.load(Ordering::Acquire) && !self.is_ejected() {
            return 0;
        }
        self.failures.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> HealthState {
        HealthState::from_parts(self.is_ejected(), self.failures())
    }

    pub fn status(&self) -> UpstreamStatus {
        UpstreamStatus {
            address: self.address.clone(),
            state: self.state(),
            failures: self.failures(),
        }
    }

    /// Trip the latch under this upstream's policy.
    ///
    /// Logs only when this call performed the transition.
    fn eject(&self, reason: &str) -> bool {
        let tripped = match self.policy {
            Ejection::TimeBounded { cooldown } => {
                let logger = Arc::clone(&self.logger);
                let address = self.address.clone();
                let cooled_down = Arc::clone(&self.cooled_down);
                self.locker.trip_for(cooldown, &self.lifetime, move || {
                    cooled_down.store(true, Ordering::Release);
                    metrics::record_upstream_ejected(&address, false);
                    logger.log(&DialEvent::Recovered { address: &address });
                })
            }
            Ejection::CheckDriven => self.locker.try_trip(),
        };

        if tripped {
            let cooldown = match self.policy {
                Ejection::TimeBounded { cooldown } => Some(cooldown),
                Ejection::CheckDriven => None,
            };
            metrics::record_upstream_ejected(&self.address, true);
            self.logger.log(&DialEvent::Ejected {
                address: &self.address,
                reason,
                cooldown,
            });
        }
        tripped
    }

    /// Feed a failed connect attempt.
    ///
    /// Only the time-bounded policy ejects on connect failures; under the
    /// check-driven policy the health loop alone owns the latch.
    pub(crate) fn report_connect_failure(&self, error: &io::Error) -> bool {
        match self.policy {
            Ejection::TimeBounded { .. } => self.eject(&error.to_string()),
            Ejection::CheckDriven => false,
        }
    }

    /// Whether the next scheduled probe should run.
    pub(crate) fn wants_probe(&self) -> bool {
        match self.policy {
            // The cooldown timer alone brings it back.
            Ejection::TimeBounded { .. } => !self.is_ejected(),
            Ejection::CheckDriven => true,
        }
    }

    /// Apply the outcome of one probe. Called from the health loop only.
    pub(crate) fn record_probe(&self, result: Result<(), ProbeError>) {
        // The timer already logged the recovery; start counting afresh.
        if !self.is_ejected() && self.cooled_down.swap(false, Ordering::AcqRel) {
            self.failures.store(0, Ordering::Relaxed);
        }

        match result {
            Ok(()) => self.probe_succeeded(),
            Err(e) => self.probe_failed(&e),
        }
    }

    fn probe_succeeded(&self) {
        let failed = self.failures.load(Ordering::Relaxed);
        let reset = self.policy == Ejection::CheckDriven && self.locker.try_reset();
        if !reset && failed == 0 {
            return;
        }

        self.failures.store(0, Ordering::Relaxed);
        if reset {
            metrics::record_upstream_ejected(&self.address, false);
        }
        self.logger.log(&DialEvent::Recovered { address: &self.address });
    }

    fn probe_failed(&self, error: &ProbeError) {
        let failed = self.failures.load(Ordering::Relaxed).saturating_add(1);
        self.failures.store(failed, Ordering::Relaxed);

        tracing::debug!(
            upstream = %self.address,
            failures = failed,
            error = %error,
            "Health check failed"
        );

        if failed >= self.threshold {
            self.eject(&error.to_string());
        }
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("address", &self.address)
            .field("ejected", &self.is_ejected())
            .field("failures", &self.failures())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Point-in-time view of an upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamStatus {
    pub address: String,
    pub state: HealthState,
    pub failures: u32,
}
