//! Upstream health state.
//!
//! # States
//! - Healthy: no recent probe failure
//! - Degraded: failing, but below the ejection threshold
//! - Ejected: latch open, excluded from selection
//!
//! # Design Decisions
//! - Derived from the latch and the failure count, never stored
//! - The latch wins: an open latch is Ejected whatever the count says

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum HealthState {
    Healthy,
    Degraded { failures: u32 },
    Ejected,
}

impl HealthState {
    pub fn from_parts(ejected: bool, failures: u32) -> Self {
        match (ejected, failures) {
            (true, _) => Self::Ejected,
            (false, 0) => Self::Healthy,
            (false, failures) => Self::Degraded { failures },
        }
    }

    /// Returns `true` if the upstream may be selected.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Self::Ejected)
    }
}
