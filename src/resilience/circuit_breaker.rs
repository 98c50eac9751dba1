//! Per-upstream ejection latch.
//!
//! # States
//! - Closed: upstream is eligible for selection
//! - Open: upstream is ejected
//!
//! # State Transitions
//! ```text
//! Closed → Open: try_trip() (first caller wins, later calls report false)
//! Open → Closed: try_reset(), either from the cooldown timer
//!                (TimeBounded) or from a successful probe (CheckDriven)
//! ```
//!
//! # Design Decisions
//! - A single atomic bit, no queuing and no ownership
//! - Every operation is non-blocking
//! - Cooldown timers are bound to the dialer's lifetime token

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How an ejected upstream becomes eligible again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ejection {
    /// Reset automatically once `cooldown` has elapsed.
    TimeBounded { cooldown: Duration },
    /// Stay open until a health check observes recovery.
    CheckDriven,
}

impl Ejection {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TimeBounded { .. } => "time_bounded",
            Self::CheckDriven => "check_driven",
        }
    }
}

/// Binary circuit state cell.
#[derive(Debug, Default)]
pub struct Locker {
    open: AtomicBool,
}

impl Locker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed → Open. Returns `true` only for the call that performed the transition.
    pub fn try_trip(&self) -> bool {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Open → Closed. Returns `true` only for the call that performed the transition.
    pub fn try_reset(&self) -> bool {
        self.open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns `true` while the upstream is ejected.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Trip and schedule an automatic reset after `cooldown`.
    ///
    /// `on_reset` runs if the timer performed the reset. The timer is dropped
    /// if `lifetime` is cancelled first. Must be called from within a Tokio runtime.
    pub fn trip_for<F>(
        self: &Arc<Self>,
        cooldown: Duration,
        lifetime: &CancellationToken,
        on_reset: F,
    ) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.try_trip() {
            return false;
        }

        let locker = Arc::clone(self);
        let lifetime = lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(cooldown) => {
                    if locker.try_reset() {
                        on_reset();
                    }
                }
                _ = lifetime.cancelled() => {}
            }
        });
        true
    }
}
