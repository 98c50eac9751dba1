//! Per-upstream metrics.
//!
//! # Metrics
//! - `rrdialer_upstream_ejected` (gauge): 1=ejected, 0=eligible
//! - `rrdialer_upstream_ejections_total` (counter): latch trips
//! - `rrdialer_fallbacks_total` (counter): connect attempts that moved on to the next upstream
//!
//! Recorded through the `metrics` facade; installing an exporter is up to the embedding process.

use metrics::{counter, gauge};

pub fn record_upstream_ejected(upstream: &str, ejected: bool) {
    gauge!("rrdialer_upstream_ejected", "upstream" => upstream.to_string())
        .set(if ejected { 1.0 } else { 0.0 });
    if ejected {
        counter!("rrdialer_upstream_ejections_total", "upstream" => upstream.to_string())
            .increment(1);
    }
}

pub fn record_fallback(upstream: &str) {
    counter!("rrdialer_fallbacks_total", "upstream" => upstream.to_string()).increment(1);
}
