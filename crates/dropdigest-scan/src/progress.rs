//! Traversal progress reporting.

use std::time::{Duration, Instant};

/// Snapshot of a breadth-first traversal, broadcast while a drop is flattened.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Number of files found so far.
    pub files_found: u64,
    /// Number of directories listed so far.
    pub dirs_listed: u64,
    /// Number of directory batches requested.
    pub batches_requested: u64,
    /// Full path of the entry currently being visited.
    pub current_path: String,
    /// Number of listing failures encountered.
    pub errors_count: u64,
    /// Time elapsed since traversal started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate discovery rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items visited (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_found + self.dirs_listed
    }
}

/// Running counters for one traversal.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    current: ScanProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            current: ScanProgress::default(),
        }
    }

    pub fn record_file(&mut self) {
        self.current.files_found += 1;
    }

    pub fn record_dir(&mut self, batches: usize) {
        self.current.dirs_listed += 1;
        self.current.batches_requested += batches as u64;
    }

    pub fn record_error(&mut self) {
        self.current.errors_count += 1;
    }

    pub fn set_current_path(&mut self, path: &str) {
        self.current.current_path.clear();
        self.current.current_path.push_str(path);
    }

    pub fn total_items(&self) -> u64 {
        self.current.total_items()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            elapsed: self.elapsed(),
            ..self.current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_snapshot() {
        let mut tracker = ProgressTracker::new();
        tracker.record_file();
        tracker.record_dir(3);
        tracker.record_error();
        tracker.set_current_path("/docs/a.txt");

        let progress = tracker.snapshot();
        assert_eq!(progress.files_found, 1);
        assert_eq!(progress.dirs_listed, 1);
        assert_eq!(progress.batches_requested, 3);
        assert_eq!(progress.errors_count, 1);
        assert_eq!(progress.current_path, "/docs/a.txt");
        assert_eq!(progress.total_items(), 2);
    }
}
