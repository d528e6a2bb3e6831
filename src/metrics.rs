// Session metrics module
//
// Lightweight counters for library, RCON and worker activity, logged on shutdown

use crate::services::{BatchReport, InstallReport, RemoveReport};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations so workers can record without locks. Shared as
/// `Arc<Metrics>` by the session and summarized with [`log_summary`](Self::log_summary).
#[derive(Debug)]
pub struct Metrics {
    /// Packages moved between the enabled and disabled directories
    pub packages_toggled: AtomicUsize,

    /// Toggle requests that failed
    pub toggle_failures: AtomicUsize,

    pub packages_installed: AtomicUsize,
    pub installs_skipped: AtomicUsize,
    pub install_failures: AtomicUsize,

    pub packages_removed: AtomicUsize,
    pub remove_failures: AtomicUsize,

    /// Manifests written
    pub exports: AtomicUsize,

    /// Total time spent building manifests (digests included)
    pub total_export_time_ms: AtomicU64,

    pub rcon_responses: AtomicU64,
    pub rcon_timeouts: AtomicU64,
    pub rcon_errors: AtomicU64,

    /// Background jobs that failed or panicked
    pub worker_failures: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            packages_toggled: AtomicUsize::new(0),
            toggle_failures: AtomicUsize::new(0),
            packages_installed: AtomicUsize::new(0),
            installs_skipped: AtomicUsize::new(0),
            install_failures: AtomicUsize::new(0),
            packages_removed: AtomicUsize::new(0),
            remove_failures: AtomicUsize::new(0),
            exports: AtomicUsize::new(0),
            total_export_time_ms: AtomicU64::new(0),
            rcon_responses: AtomicU64::new(0),
            rcon_timeouts: AtomicU64::new(0),
            rcon_errors: AtomicU64::new(0),
            worker_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_toggle_batch(&self, report: &BatchReport) {
        self.packages_toggled
            .fetch_add(report.moved, Ordering::Relaxed);
        self.toggle_failures
            .fetch_add(report.failed(), Ordering::Relaxed);
    }

    pub fn record_install(&self, report: &InstallReport) {
        self.packages_installed
            .fetch_add(report.installed, Ordering::Relaxed);
        self.installs_skipped
            .fetch_add(report.skipped, Ordering::Relaxed);
        self.install_failures
            .fetch_add(report.failed, Ordering::Relaxed);
    }

    pub fn record_remove(&self, report: &RemoveReport) {
        self.packages_removed
            .fetch_add(report.removed, Ordering::Relaxed);
        self.remove_failures
            .fetch_add(report.failed(), Ordering::Relaxed);
    }

    pub fn record_export(&self, duration: Duration) {
        self.exports.fetch_add(1, Ordering::Relaxed);
        self.total_export_time_ms
            .fetch_add(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub fn record_rcon_response(&self) {
        self.rcon_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rcon_timeout(&self) {
        self.rcon_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rcon_error(&self) {
        self.rcon_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_failure(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average manifest build time in milliseconds
    pub fn avg_export_time_ms(&self) -> f64 {
        let total = self.total_export_time_ms.load(Ordering::Relaxed);
        let count = self.exports.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Toggles: {} moved, {} failed",
            self.packages_toggled.load(Ordering::Relaxed),
            self.toggle_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Installs: {} installed, {} skipped, {} failed",
            self.packages_installed.load(Ordering::Relaxed),
            self.installs_skipped.load(Ordering::Relaxed),
            self.install_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Removals: {} removed, {} failed",
            self.packages_removed.load(Ordering::Relaxed),
            self.remove_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Exports: {} (avg: {:.2}ms)",
            self.exports.load(Ordering::Relaxed),
            self.avg_export_time_ms()
        );
        tracing::info!(
            "RCON: {} responses, {} timeouts, {} errors",
            self.rcon_responses.load(Ordering::Relaxed),
            self.rcon_timeouts.load(Ordering::Relaxed),
            self.rcon_errors.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Worker failures: {}",
            self.worker_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.packages_toggled.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.rcon_timeouts.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_reports() {
        let metrics = Metrics::new();

        metrics.record_toggle_batch(&BatchReport {
            moved: 3,
            unchanged: 1,
            failures: vec![("a.pk3".to_string(), "denied".to_string())],
        });
        metrics.record_install(&InstallReport {
            installed: 2,
            skipped: 1,
            failed: 0,
        });
        metrics.record_remove(&RemoveReport {
            removed: 4,
            failures: Vec::new(),
        });

        assert_eq!(metrics.packages_toggled.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.toggle_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packages_installed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.installs_skipped.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packages_removed.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_export_time() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_export_time_ms(), 0.0);

        metrics.record_export(Duration::from_millis(100));
        metrics.record_export(Duration::from_millis(200));
        assert_eq!(metrics.avg_export_time_ms(), 150.0);
    }

    #[test]
    fn test_rcon_and_worker_counters() {
        let metrics = Metrics::new();

        metrics.record_rcon_response();
        metrics.record_rcon_timeout();
        metrics.record_rcon_timeout();
        metrics.record_rcon_error();
        metrics.record_worker_failure();

        assert_eq!(metrics.rcon_responses.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rcon_timeouts.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.rcon_errors.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.worker_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
