//! Round-robin selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::upstream::Upstream;

/// Shared rotation cursor.
///
/// Every selection consumes one cursor slot, even when it has to skip
/// ejected upstreams.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor and return its new position.
    fn advance(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// The first eligible upstream starting at the advanced cursor.
    pub fn next_upstream(&self, upstreams: &[Arc<Upstream>]) -> Option<Arc<Upstream>> {
        if upstreams.is_empty() {
            return None;
        }

        let start = self.advance();
        let len = upstreams.len();
        (0..len)
            .map(|i| &upstreams[(start + i) % len])
            .find(|upstream| !upstream.is_ejected())
            .cloned()
    }

    /// Every eligible upstream, in rotation order starting at the advanced cursor.
    pub fn rotation(&self, upstreams: &[Arc<Upstream>]) -> Vec<Arc<Upstream>> {
        if upstreams.is_empty() {
            return Vec::new();
        }

        let start = self.advance();
        let len = upstreams.len();
        (0..len)
            .map(|i| &upstreams[(start + i) % len])
            .filter(|upstream| !upstream.is_ejected())
            .cloned()
            .collect()
    }
}
