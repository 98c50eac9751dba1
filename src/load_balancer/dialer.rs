//! Round-robin dialer.
//!
//! # Responsibilities
//! - Hold the fixed set of upstreams and the shared rotation cursor
//! - Select an address (`pick`, `address`) or every eligible one (`pick_all`)
//! - Connect with optional fallback to the next upstream
//! - Start one health monitor per upstream and stop them on drop

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Options;
use crate::error::{DialError, DialResult};
use crate::health::active::HealthMonitor;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::upstream::{Upstream, UpstreamStatus};
use crate::net::dial::{Dial, Network, TcpDial};
use crate::observability::logging::{DialEvent, Logger};
use crate::observability::metrics;

/// Client-side round-robin dialer over a fixed upstream list.
pub struct Dialer<D = TcpDial> {
    upstreams: Vec<Arc<Upstream>>,
    lb: RoundRobin,
    dial: D,
    next_upstream: bool,
    logger: Arc<dyn Logger>,
    /// Child of the caller's token; cancelled on drop.
    lifetime: CancellationToken,
    monitors: Vec<JoinHandle<()>>,
}

impl Dialer<TcpDial> {
    /// Create a dialer that connects over plain TCP.
    ///
    /// Health monitors run until `cancel` is cancelled or the dialer is dropped.
    ///
    /// # Panics
    /// When a health check is configured, this must be called from within a
    /// Tokio runtime.
    pub fn new<I, S>(cancel: &CancellationToken, addresses: I, options: Options) -> DialResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_dial(cancel, addresses, options, TcpDial::default())
    }
}

impl<D: Dial> Dialer<D> {
    /// Create a dialer with a custom dial primitive.
    pub fn with_dial<I, S>(
        cancel: &CancellationToken,
        addresses: I,
        options: Options,
        dial: D,
    ) -> DialResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lifetime = cancel.child_token();
        let policy = options.ejection_policy();

        let upstreams: Vec<Arc<Upstream>> = addresses
            .into_iter()
            .map(|address| {
                Arc::new(Upstream::new(
                    address.into(),
                    policy,
                    options.threshold,
                    Arc::clone(&options.logger),
                    lifetime.clone(),
                ))
            })
            .collect();

        if upstreams.is_empty() {
            return Err(DialError::NoUpstreams);
        }

        let monitors = match &options.check {
            Some(check) => upstreams
                .iter()
                .map(|upstream| {
                    HealthMonitor::new(
                        Arc::clone(upstream),
                        Arc::clone(check),
                        options.check_interval,
                        options.check_timeout,
                        lifetime.clone(),
                    )
                    .spawn()
                })
                .collect(),
            None => Vec::new(),
        };

        tracing::debug!(
            upstreams = upstreams.len(),
            policy = policy.name(),
            health_checks = !monitors.is_empty(),
            next_upstream = options.next_upstream,
            "Dialer created"
        );

        Ok(Self {
            upstreams,
            lb: RoundRobin::new(),
            dial,
            next_upstream: options.next_upstream,
            logger: options.logger,
            lifetime,
            monitors,
        })
    }

    /// Select the next eligible upstream.
    pub fn pick(&self) -> DialResult<Arc<Upstream>> {
        self.lb
            .next_upstream(&self.upstreams)
            .ok_or(DialError::AllUnavailable)
    }

    /// Every eligible upstream in rotation order.
    pub fn pick_all(&self) -> DialResult<Vec<Arc<Upstream>>> {
        let eligible = self.lb.rotation(&self.upstreams);
        if eligible.is_empty() {
            return Err(DialError::AllUnavailable);
        }
        Ok(eligible)
    }

    /// The address `pick` selects, for callers that connect on their own.
    pub fn address(&self) -> DialResult<String> {
        self.pick().map(|upstream| upstream.address().to_string())
    }

    /// Report a failed connection to `address` made outside of `connect`.
    ///
    /// Returns `true` if the upstream was ejected by this call.
    ///
    /// # Panics
    /// Under the time-bounded policy the ejection starts a cooldown timer, so
    /// this must be called from within a Tokio runtime.
    pub fn report_failure(&self, address: &str, error: &std::io::Error) -> DialResult<bool> {
        let upstream = self
            .upstreams
            .iter()
            .find(|upstream| upstream.address() == address)
            .ok_or_else(|| DialError::UnknownUpstream(address.to_string()))?;
        Ok(upstream.report_connect_failure(error))
    }

    /// Snapshot of every upstream, in configuration order.
    pub fn upstreams(&self) -> Vec<UpstreamStatus> {
        self.upstreams.iter().map(|upstream| upstream.status()).collect()
    }

    /// Connect to the next eligible upstream.
    pub async fn connect(&self, network: Network) -> DialResult<D::Conn> {
        self.connect_with(network, &self.lifetime, None).await
    }

    /// Connect with a per-attempt timeout.
    pub async fn connect_timeout(
        &self,
        network: Network,
        timeout: Duration,
    ) -> DialResult<D::Conn> {
        self.connect_with(network, &self.lifetime, Some(timeout)).await
    }

    /// Connect under the caller's cancellation token.
    ///
    /// Cancellation takes precedence over trying the next upstream.
    pub async fn connect_with(
        &self,
        network: Network,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> DialResult<D::Conn> {
        let candidates = self.pick_all()?;
        let last = candidates.len() - 1;

        for (i, upstream) in candidates.iter().enumerate() {
            let address = upstream.address();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DialError::Cancelled),
                _ = self.lifetime.cancelled() => return Err(DialError::Cancelled),
                res = self.dial_once(network, address, timeout) => res,
            };

            let source = match result {
                Ok(conn) => return Ok(conn),
                Err(e) => e,
            };

            if cancel.is_cancelled() || self.lifetime.is_cancelled() {
                return Err(DialError::Cancelled);
            }

            upstream.report_connect_failure(&source);

            if self.next_upstream && i < last {
                metrics::record_fallback(address);
                self.logger.log(&DialEvent::Fallback { address, error: &source });
                continue;
            }

            self.logger.log(&DialEvent::ConnectFailed { address, error: &source });
            return Err(DialError::Connect {
                address: address.to_string(),
                source,
            });
        }

        Err(DialError::AllUnavailable)
    }

    async fn dial_once(
        &self,
        network: Network,
        address: &str,
        timeout: Option<Duration>,
    ) -> std::io::Result<D::Conn> {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.dial.dial(network, address))
                .await
                .unwrap_or_else(|_| {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("dial {} timed out after {:?}", address, timeout),
                    ))
                }),
            None => self.dial.dial(network, address).await,
        }
    }

    /// Stop health monitors and cooldown timers.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
    }

    /// Returns `true` once the governing lifetime has ended.
    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Number of running health monitors.
    pub fn active_monitors(&self) -> usize {
        self.monitors.iter().filter(|handle| !handle.is_finished()).count()
    }
}

impl<D> Drop for Dialer<D> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

impl<D> std::fmt::Debug for Dialer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialer")
            .field("upstreams", &self.upstreams)
            .field("next_upstream", &self.next_upstream)
            .field("monitors", &self.monitors.len())
            .finish_non_exhaustive()
    }
}
