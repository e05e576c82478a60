//! Health and status reporting
//!
//! This module tracks what the health-check endpoint needs to know about
//! the pipeline: pool utilization, last fetch latency and recent failures
//! by kind.

use crate::browser::PoolStatus;
use crate::ErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Point-in-time health snapshot
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub pool: PoolStatus,

    /// Duration of the most recent successful fetch
    pub last_fetch_latency_ms: Option<u64>,

    /// Failures within the failure window, by kind
    pub failures_by_kind: BTreeMap<ErrorKind, u64>,

    /// Requests processed since startup
    pub requests_total: u64,

    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn total_failures(&self) -> u64 {
        self.failures_by_kind.values().sum()
    }
}

#[derive(Debug, Default)]
struct Counters {
    last_fetch_latency: Option<Duration>,
    failures: VecDeque<(Instant, ErrorKind)>,
    requests_total: u64,
}

/// Accumulates request outcomes for health reporting
#[derive(Debug)]
pub struct HealthMonitor {
    window: Duration,
    counters: Mutex<Counters>,
}

impl HealthMonitor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            counters: Mutex::new(Counters::default()),
        }
    }

    fn counters(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_request(&self) {
        self.counters().requests_total += 1;
    }

    pub fn record_latency(&self, latency: Duration) {
        self.counters().last_fetch_latency = Some(latency);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        let now = Instant::now();
        let mut counters = self.counters();
        counters.failures.push_back((now, kind));
        prune(&mut counters.failures, now, self.window);
    }

    /// Builds a report combining recorded outcomes with the pool status
    pub fn report(&self, pool: PoolStatus) -> HealthReport {
        let now = Instant::now();
        let mut counters = self.counters();
        prune(&mut counters.failures, now, self.window);

        let mut failures_by_kind = BTreeMap::new();
        for (_, kind) in &counters.failures {
            *failures_by_kind.entry(*kind).or_insert(0) += 1;
        }

        HealthReport {
            pool,
            last_fetch_latency_ms: counters
                .last_fetch_latency
                .map(|d| d.as_millis() as u64),
            failures_by_kind,
            requests_total: counters.requests_total,
            generated_at: Utc::now(),
        }
    }
}

/// Drops failures older than the window
fn prune(failures: &mut VecDeque<(Instant, ErrorKind)>, now: Instant, window: Duration) {
    while let Some((at, _)) = failures.front() {
        if now.duration_since(*at) > window {
            failures.pop_front();
        } else {
            break;
        }
    }
}

/// Prints a health report to stderr in a formatted manner
pub fn print_health(report: &HealthReport) {
    eprintln!("=== Pipeline Health ===\n");

    eprintln!("Browser Pool:");
    eprintln!("  Capacity: {}", report.pool.capacity);
    eprintln!("  Busy: {}", report.pool.busy);
    eprintln!("  Idle: {}", report.pool.idle);
    eprintln!();

    match report.last_fetch_latency_ms {
        Some(ms) => eprintln!("Last fetch latency: {} ms", ms),
        None => eprintln!("Last fetch latency: n/a"),
    }
    eprintln!("Requests processed: {}", report.requests_total);

    if report.failures_by_kind.is_empty() {
        eprintln!("Recent failures: none");
    } else {
        eprintln!("Recent failures ({}):", report.total_failures());
        let mut counts: Vec<_> = report.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in counts {
            eprintln!("  {}: {}", kind, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolStatus {
        PoolStatus {
            capacity: 2,
            busy: 1,
            idle: 1,
        }
    }

    #[test]
    fn test_empty_report() {
        let monitor = HealthMonitor::new(Duration::from_secs(300));
        let report = monitor.report(pool());
        assert_eq!(report.requests_total, 0);
        assert_eq!(report.last_fetch_latency_ms, None);
        assert!(report.failures_by_kind.is_empty());
        assert_eq!(report.pool.busy, 1);
    }

    #[test]
    fn test_failures_counted_by_kind() {
        let monitor = HealthMonitor::new(Duration::from_secs(300));
        monitor.record_failure(ErrorKind::Timeout);
        monitor.record_failure(ErrorKind::Timeout);
        monitor.record_failure(ErrorKind::PoolExhausted);
        monitor.record_latency(Duration::from_millis(42));
        monitor.record_request();

        let report = monitor.report(pool());
        assert_eq!(report.failures_by_kind.get(&ErrorKind::Timeout), Some(&2));
        assert_eq!(
            report.failures_by_kind.get(&ErrorKind::PoolExhausted),
            Some(&1)
        );
        assert_eq!(report.total_failures(), 3);
        assert_eq!(report.last_fetch_latency_ms, Some(42));
        assert_eq!(report.requests_total, 1);
    }

    #[test]
    fn test_old_failures_leave_window() {
        let monitor = HealthMonitor::new(Duration::ZERO);
        monitor.record_failure(ErrorKind::ConnectionFailed);
        std::thread::sleep(Duration::from_millis(5));
        assert!(monitor.report(pool()).failures_by_kind.is_empty());
    }

    #[test]
    fn test_report_serializes_kinds_as_keys() {
        let monitor = HealthMonitor::new(Duration::from_secs(300));
        monitor.record_failure(ErrorKind::RenderFailed);
        let json = serde_json::to_value(monitor.report(pool())).unwrap();
        assert_eq!(json["failures_by_kind"]["render_failed"], 1);
        assert_eq!(json["pool"]["capacity"], 2);
    }
}
