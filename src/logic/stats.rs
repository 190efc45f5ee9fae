//! Serving counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Lock-free counters shared by all request handlers
#[derive(Debug, Default)]
pub struct ServingStats {
    explanations: AtomicU64,
    failures: AtomicU64,
    latency_sum_us: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub explanations: u64,
    pub failures: u64,
    pub avg_latency_ms: f64,
}

impl ServingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.explanations.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let count = self.explanations.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        StatsSnapshot {
            explanations: count,
            failures: self.failures.load(Ordering::Relaxed),
            avg_latency_ms: avg,
        }
    }
}
