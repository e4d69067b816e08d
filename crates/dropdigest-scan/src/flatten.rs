//! Breadth-first flattening of a drop payload.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::broadcast;

use dropdigest_core::DropWarning;

use crate::entry::Entry;
use crate::enumerate::read_all_entries;
use crate::progress::{ProgressTracker, ScanProgress};

/// How often (in visited entries) a progress update is broadcast.
const PROGRESS_INTERVAL: u64 = 100;

/// Summary statistics for one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Files found.
    pub files: u64,
    /// Directories enumerated.
    pub directories: u64,
    /// Directory batches requested.
    pub batches: u64,
    /// Directories whose listing failed part way.
    pub listing_failures: u64,
    /// Deepest level visited (top-level entries are depth 0).
    pub max_depth: u32,
    /// Time spent traversing.
    pub elapsed: Duration,
}

/// Files of a drop in breadth-first discovery order.
#[derive(Debug, Default)]
pub struct FlatFileList {
    /// File entries, in discovery order.
    pub files: Vec<Entry>,
    /// Traversal statistics.
    pub stats: TraversalStats,
    /// Listing failures encountered along the way.
    pub warnings: Vec<DropWarning>,
}

impl FlatFileList {
    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files were found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full paths of all files, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(Entry::full_path).collect()
    }
}

/// Breadth-first traversal over dropped entries.
pub struct TreeFlattener {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeFlattener {
    /// Create a new flattener.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to traversal progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Flatten a drop payload into its files.
    ///
    /// Top-level entries are queued in payload order. Files are appended to
    /// the output as they leave the queue; each directory is enumerated once
    /// and its children are queued behind everything already pending.
    pub async fn flatten(&self, payload: Vec<Entry>) -> FlatFileList {
        let mut queue: VecDeque<(Entry, u32)> = payload.into_iter().map(|e| (e, 0)).collect();
        let mut flat = FlatFileList::default();
        let mut tracker = ProgressTracker::new();

        while let Some((entry, depth)) = queue.pop_front() {
            flat.stats.max_depth = flat.stats.max_depth.max(depth);
            tracker.set_current_path(entry.full_path());

            match entry {
                Entry::File(_) => {
                    tracker.record_file();
                    flat.stats.files += 1;
                    flat.files.push(entry);
                }
                Entry::Directory(ref dir) => {
                    let mut listing = dir.create_reader();
                    let contents = read_all_entries(listing.as_mut(), dir.full_path()).await;

                    tracker.record_dir(contents.batches);
                    flat.stats.directories += 1;
                    flat.stats.batches += contents.batches as u64;

                    if let Some(warning) = contents.warning {
                        tracker.record_error();
                        flat.stats.listing_failures += 1;
                        flat.warnings.push(warning);
                    }

                    tracing::trace!(
                        path = dir.full_path(),
                        children = contents.entries.len(),
                        "directory enumerated"
                    );
                    queue.extend(contents.entries.into_iter().map(|e| (e, depth + 1)));
                }
            }

            if tracker.total_items() % PROGRESS_INTERVAL == 1 {
                let _ = self.progress_tx.send(tracker.snapshot());
            }
        }

        flat.stats.elapsed = tracker.elapsed();
        tracing::debug!(
            files = flat.stats.files,
            directories = flat.stats.directories,
            "drop flattened"
        );
        flat
    }
}

impl Default for TreeFlattener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDir, MemoryFile, MemoryTree};

    #[tokio::test]
    async fn test_files_only_payload_keeps_order() {
        let tree = MemoryTree::new()
            .file(MemoryFile::new("c.txt", "3"))
            .file(MemoryFile::new("a.txt", "1"))
            .file(MemoryFile::new("b.txt", "2"));

        let flat = TreeFlattener::new().flatten(tree.entries()).await;
        assert_eq!(flat.paths(), ["/c.txt", "/a.txt", "/b.txt"]);
        assert_eq!(flat.stats.directories, 0);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        // /top.txt
        // /d1/{f1, sub/{deep}, f2}
        // /d2/{g1}
        let tree = MemoryTree::new()
            .dir(
                MemoryDir::new("d1")
                    .file(MemoryFile::new("f1", ""))
                    .dir(MemoryDir::new("sub").file(MemoryFile::new("deep", "")))
                    .file(MemoryFile::new("f2", "")),
            )
            .file(MemoryFile::new("top.txt", ""))
            .dir(MemoryDir::new("d2").file(MemoryFile::new("g1", "")));

        let flat = TreeFlattener::new().flatten(tree.entries()).await;
        assert_eq!(
            flat.paths(),
            ["/top.txt", "/d1/f1", "/d1/f2", "/d2/g1", "/d1/sub/deep"]
        );
        assert_eq!(flat.stats.max_depth, 2);
        assert_eq!(flat.stats.directories, 3);
    }

    #[tokio::test]
    async fn test_each_directory_listed_once() {
        let tree = MemoryTree::new().dir(
            MemoryDir::new("root")
                .dir(MemoryDir::new("a").file(MemoryFile::new("1", "")))
                .dir(MemoryDir::new("b").dir(MemoryDir::new("c"))),
        );

        let flat = TreeFlattener::new().flatten(tree.entries()).await;
        assert_eq!(flat.len(), 1);
        for path in ["/root", "/root/a", "/root/b", "/root/b/c"] {
            assert_eq!(tree.listings_created(path), 1, "{path}");
        }
    }

    #[tokio::test]
    async fn test_empty_directories_contribute_nothing() {
        let tree = MemoryTree::new()
            .dir(MemoryDir::new("empty"))
            .dir(MemoryDir::new("nested").dir(MemoryDir::new("also_empty")));

        let flat = TreeFlattener::new().flatten(tree.entries()).await;
        assert!(flat.is_empty());
        assert_eq!(flat.stats.directories, 3);
    }

    #[tokio::test]
    async fn test_listing_failure_is_partial() {
        let tree = MemoryTree::new()
            .dir(
                MemoryDir::new("broken")
                    .fail_batch(0)
                    .file(MemoryFile::new("lost", "")),
            )
            .dir(MemoryDir::new("fine").file(MemoryFile::new("kept", "")));

        let flat = TreeFlattener::new().flatten(tree.entries()).await;
        assert_eq!(flat.paths(), ["/fine/kept"]);
        assert_eq!(flat.stats.listing_failures, 1);
        assert_eq!(flat.warnings.len(), 1);
        assert_eq!(flat.warnings[0].path, "/broken");
    }

    #[tokio::test]
    async fn test_progress_is_broadcast() {
        let tree = MemoryTree::new().file(MemoryFile::new("a", ""));
        let flattener = TreeFlattener::new();
        let mut rx = flattener.subscribe();

        flattener.flatten(tree.entries()).await;
        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.files_found, 1);
        assert_eq!(progress.current_path, "/a");
    }
}
