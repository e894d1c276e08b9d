//! Metrics collection module
//!
//! Process-wide request counters updated by the server middleware and read
//! by the reporting endpoints. Nothing here is persisted; counters reset on
//! restart.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Counters guarded by the store lock
#[derive(Debug, Default)]
struct Counters {
    requests_total: u64,
    requests_by_endpoint: HashMap<String, u64>,
    errors_total: u64,
}

/// Point-in-time view of the metrics store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total number of requests seen since start
    pub requests_total: u64,
    /// Per-endpoint request counts (matched routes only)
    pub requests_by_endpoint: HashMap<String, u64>,
    /// Total number of 404/5xx responses
    pub errors_total: u64,
    /// Elapsed seconds since process start, rounded to 2 decimals
    pub uptime_seconds: f64,
}

/// Request counter store
#[derive(Debug)]
pub struct MetricsStore {
    counters: RwLock<Counters>,
    started: Instant,
}

impl MetricsStore {
    /// Create a new store with zeroed counters and start time = now
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            started: Instant::now(),
        }
    }

    /// Count one inbound request against the given endpoint
    pub fn record_request(&self, endpoint: &str) {
        let mut counters = self.counters.write();
        counters.requests_total += 1;
        *counters
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    /// Count one request that never matched a route. It contributes to the
    /// total but not to the per-endpoint map.
    pub fn record_unmatched(&self) {
        self.counters.write().requests_total += 1;
    }

    /// Count one error response (404 or 5xx)
    pub fn record_error(&self) {
        self.counters.write().errors_total += 1;
    }

    /// Take a consistent copy of the counters; uptime is computed fresh on
    /// every call.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.read();
        MetricsSnapshot {
            requests_total: counters.requests_total,
            requests_by_endpoint: counters.requests_by_endpoint.clone(),
            errors_total: counters.errors_total,
            uptime_seconds: round2(self.started.elapsed().as_secs_f64()),
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an elapsed-seconds value as a short human-readable string,
/// e.g. `90061.0` becomes `"1d 1h 1m 1s"`.
///
/// Zero-valued day/hour/minute tokens are omitted; the seconds token is
/// always present. Negative input clamps to zero.
pub fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86400;
    let hours = (total % 86400) / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", secs));

    parts.join(" ")
}

/// Shared metrics store for use across threads
pub type SharedMetrics = Arc<MetricsStore>;

/// Create a new shared metrics store
pub fn create_shared_metrics() -> SharedMetrics {
    Arc::new(MetricsStore::new())
}
