// Run metrics module
//
// Counters for one packaging run, logged as a summary when the run ends

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Packaging run metrics
///
/// Uses atomic operations so the packager can be shared across worker tasks
/// without locks; the current driver is sequential.
#[derive(Debug)]
pub struct RunMetrics {
    /// Number of entities processed
    pub entities_processed: AtomicUsize,

    /// Packages whose archive was created
    pub packages_built: AtomicUsize,

    /// Packages that failed during assembly or archiving
    pub packages_failed: AtomicUsize,

    /// Asset and descriptor files copied into package trees
    pub files_copied: AtomicUsize,

    /// Copies skipped because the destination already existed
    pub copy_conflicts: AtomicUsize,

    /// Copies that failed; the package is still archived without them
    pub copy_failures: AtomicUsize,

    /// Vehicle descriptors whose empty audio hash was filled in
    pub descriptors_patched: AtomicUsize,

    /// Total archiver time in milliseconds
    pub total_archive_time_ms: AtomicU64,

    /// Run start time
    start_time: Instant,
}

impl RunMetrics {
    /// Create a new RunMetrics instance
    pub fn new() -> Self {
        Self {
            entities_processed: AtomicUsize::new(0),
            packages_built: AtomicUsize::new(0),
            packages_failed: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
            copy_conflicts: AtomicUsize::new(0),
            copy_failures: AtomicUsize::new(0),
            descriptors_patched: AtomicUsize::new(0),
            total_archive_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_entity(&self) {
        self.entities_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_package_built(&self) {
        self.packages_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_package_failed(&self) {
        self.packages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_copied(&self) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_copy_conflict(&self) {
        self.copy_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_copy_failure(&self) {
        self.copy_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_descriptor_patched(&self) {
        self.descriptors_patched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record time spent in one archiver invocation
    pub fn record_archive_time(&self, duration: Duration) {
        self.total_archive_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total run time
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average archiver time per built package in milliseconds
    pub fn avg_archive_time_ms(&self) -> f64 {
        let total = self.total_archive_time_ms.load(Ordering::Relaxed);
        let count = self.packages_built.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Packaging Summary ===");
        tracing::info!("Run time: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Entities: {}, packages: {} built, {} failed",
            self.entities_processed.load(Ordering::Relaxed),
            self.packages_built.load(Ordering::Relaxed),
            self.packages_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files copied: {} ({} already present, {} failed), descriptors patched: {}",
            self.files_copied.load(Ordering::Relaxed),
            self.copy_conflicts.load(Ordering::Relaxed),
            self.copy_failures.load(Ordering::Relaxed),
            self.descriptors_patched.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Archiver time: {:.2}s (avg: {:.2}ms per package)",
            self.total_archive_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_archive_time_ms()
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
