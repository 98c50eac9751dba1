//! Active health checking.
//!
//! # Responsibilities
//! - Probe one upstream on a fixed interval
//! - Bound every probe with the configured timeout
//! - Feed results into the upstream's state machine
//! - Stop as soon as the governing lifetime is cancelled

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::health::checks::CheckFn;
use crate::load_balancer::upstream::Upstream;

/// Background health check loop for a single upstream.
pub struct HealthMonitor {
    upstream: Arc<Upstream>,
    check: CheckFn,
    interval: Duration,
    timeout: Duration,
    lifetime: CancellationToken,
}

impl HealthMonitor {
    pub fn new(
        upstream: Arc<Upstream>,
        check: CheckFn,
        interval: Duration,
        timeout: Duration,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            upstream,
            check,
            interval,
            timeout,
            lifetime,
        }
    }

    /// Starts the health check task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::debug!(
            upstream = %self.upstream.address(),
            interval = ?self.interval,
            timeout = ?self.timeout,
            policy = self.upstream.policy().name(),
            "Health monitor starting"
        );

        // First probe one interval after start.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_once().await;
                }
                _ = self.lifetime.cancelled() => {
                    break;
                }
            }
        }

        tracing::debug!(upstream = %self.upstream.address(), "Health monitor stopped");
    }

    async fn check_once(&self) {
        if !self.upstream.wants_probe() {
            return;
        }

        let probe = (self.check)(self.lifetime.child_token(), self.upstream.address().to_string());
        let result = tokio::select! {
            res = time::timeout(self.timeout, probe) => match res {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(self.timeout)),
            },
            _ = self.lifetime.cancelled() => return,
        };

        // A probe cut short by shutdown says nothing about the upstream.
        if self.lifetime.is_cancelled() {
            return;
        }

        self.upstream.record_probe(result);
    }
}
