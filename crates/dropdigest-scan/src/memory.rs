//! In-memory drop backend.
//!
//! Serves a scripted tree of files and directories through the platform
//! traits. Directories answer in configurable batches and can fail a given
//! batch; files can fail to resolve or to read, can be restricted to the
//! event-driven read primitive, and can be slowed down with a delay.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use dropdigest_core::{FileContent, PlatformError, ReadMode};

use crate::entry::{
    BoxFuture, DirectoryEntry, DirectoryListing, Entry, FileEntry, FileObject, ReadCompletion,
    ReadOutcome,
};

/// Default number of children returned per listing batch.
const DEFAULT_BATCH_SIZE: usize = 100;

/// A scripted file.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    content: Vec<u8>,
    mime_type: String,
    last_modified: SystemTime,
    fail_resolve: bool,
    fail_read: bool,
    direct_read: bool,
    abandon_read: bool,
    delay: Option<Duration>,
}

impl MemoryFile {
    /// Create a file with the given content.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_type: String::new(),
            last_modified: SystemTime::UNIX_EPOCH,
            fail_resolve: false,
            fail_read: false,
            direct_read: true,
            abandon_read: false,
            delay: None,
        }
    }

    /// Set the MIME type hint.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the last modification time.
    pub fn modified(mut self, time: SystemTime) -> Self {
        self.last_modified = time;
        self
    }

    /// Make resolution of this file fail.
    pub fn fail_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    /// Make reads of this file fail.
    pub fn fail_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Only expose the event-driven read primitive.
    pub fn callback_only(mut self) -> Self {
        self.direct_read = false;
        self
    }

    /// Event-driven reads drop their completion without reporting.
    pub fn abandon_read(mut self) -> Self {
        self.direct_read = false;
        self.abandon_read = true;
        self
    }

    /// Delay every read by `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A scripted directory.
#[derive(Debug, Clone)]
pub struct MemoryDir {
    name: String,
    children: Vec<MemoryNode>,
    batch_size: usize,
    fail_batch: Option<usize>,
}

impl MemoryDir {
    /// Create an empty directory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            fail_batch: None,
        }
    }

    /// Add a file child.
    pub fn file(mut self, file: MemoryFile) -> Self {
        self.children.push(MemoryNode::File(Arc::new(file)));
        self
    }

    /// Add a directory child.
    pub fn dir(mut self, dir: MemoryDir) -> Self {
        self.children.push(MemoryNode::Dir(Arc::new(dir)));
        self
    }

    /// Number of children per listing batch (at least 1).
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Fail the listing request with this zero-based batch index.
    pub fn fail_batch(mut self, index: usize) -> Self {
        self.fail_batch = Some(index);
        self
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    File(Arc<MemoryFile>),
    Dir(Arc<MemoryDir>),
}

/// Counters shared by every entry of a tree.
#[derive(Debug, Default)]
struct MemoryStats {
    listings: DashMap<String, usize>,
    reads: DashMap<String, usize>,
}

/// A scripted drop payload.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    roots: Vec<MemoryNode>,
    stats: Arc<MemoryStats>,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level file.
    pub fn file(mut self, file: MemoryFile) -> Self {
        self.roots.push(MemoryNode::File(Arc::new(file)));
        self
    }

    /// Add a top-level directory.
    pub fn dir(mut self, dir: MemoryDir) -> Self {
        self.roots.push(MemoryNode::Dir(Arc::new(dir)));
        self
    }

    /// Produce the drop payload. Can be called repeatedly.
    pub fn entries(&self) -> Vec<Entry> {
        self.roots
            .iter()
            .map(|node| make_entry(node, "", &self.stats))
            .collect()
    }

    /// Number of listings created for the directory at `full_path`.
    pub fn listings_created(&self, full_path: &str) -> usize {
        self.stats.listings.get(full_path).map(|n| *n).unwrap_or(0)
    }

    /// Number of reads started for the file at `full_path`.
    pub fn reads_started(&self, full_path: &str) -> usize {
        self.stats.reads.get(full_path).map(|n| *n).unwrap_or(0)
    }
}

fn make_entry(node: &MemoryNode, parent_path: &str, stats: &Arc<MemoryStats>) -> Entry {
    match node {
        MemoryNode::File(file) => Entry::File(Box::new(MemoryFileEntry {
            full_path: format!("{parent_path}/{}", file.name),
            file: Arc::clone(file),
            stats: Arc::clone(stats),
        })),
        MemoryNode::Dir(dir) => Entry::Directory(Box::new(MemoryDirEntry {
            full_path: format!("{parent_path}/{}", dir.name),
            dir: Arc::clone(dir),
            stats: Arc::clone(stats),
        })),
    }
}

struct MemoryFileEntry {
    full_path: String,
    file: Arc<MemoryFile>,
    stats: Arc<MemoryStats>,
}

impl FileEntry for MemoryFileEntry {
    fn name(&self) -> &str {
        &self.file.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn resolve(&self) -> BoxFuture<'_, Result<Box<dyn FileObject>, PlatformError>> {
        Box::pin(async move {
            if self.file.fail_resolve {
                return Err(PlatformError::NotFound {
                    path: self.full_path.clone(),
                });
            }
            Ok(Box::new(MemoryFileObject {
                full_path: self.full_path.clone(),
                file: Arc::clone(&self.file),
                stats: Arc::clone(&self.stats),
            }) as Box<dyn FileObject>)
        })
    }
}

struct MemoryDirEntry {
    full_path: String,
    dir: Arc<MemoryDir>,
    stats: Arc<MemoryStats>,
}

impl DirectoryEntry for MemoryDirEntry {
    fn name(&self) -> &str {
        &self.dir.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn create_reader(&self) -> Box<dyn DirectoryListing> {
        *self.stats.listings.entry(self.full_path.clone()).or_insert(0) += 1;
        Box::new(MemoryListing {
            full_path: self.full_path.clone(),
            dir: Arc::clone(&self.dir),
            stats: Arc::clone(&self.stats),
            cursor: 0,
            batch_index: 0,
        })
    }
}

struct MemoryListing {
    full_path: String,
    dir: Arc<MemoryDir>,
    stats: Arc<MemoryStats>,
    cursor: usize,
    batch_index: usize,
}

impl DirectoryListing for MemoryListing {
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Vec<Entry>, PlatformError>> {
        Box::pin(async move {
            let index = self.batch_index;
            self.batch_index += 1;

            if self.dir.fail_batch == Some(index) {
                return Err(PlatformError::other(format!(
                    "listing {} failed at batch {index}",
                    self.full_path
                )));
            }

            let end = (self.cursor + self.dir.batch_size).min(self.dir.children.len());
            let batch = self.dir.children[self.cursor..end]
                .iter()
                .map(|node| make_entry(node, &self.full_path, &self.stats))
                .collect();
            self.cursor = end;
            Ok(batch)
        })
    }
}

struct MemoryFileObject {
    full_path: String,
    file: Arc<MemoryFile>,
    stats: Arc<MemoryStats>,
}

impl MemoryFileObject {
    fn record_read(&self) {
        *self.stats.reads.entry(self.full_path.clone()).or_insert(0) += 1;
    }
}

async fn read_memory(file: &MemoryFile, full_path: &str, mode: ReadMode) -> ReadOutcome {
    if let Some(delay) = file.delay {
        tokio::time::sleep(delay).await;
    }
    if file.fail_read {
        return Err(PlatformError::other(format!(
            "Problem parsing file: {full_path}"
        )));
    }
    FileContent::from_bytes(file.content.clone(), mode).map_err(|_| PlatformError::InvalidText {
        path: full_path.to_string(),
    })
}

impl FileObject for MemoryFileObject {
    fn size(&self) -> u64 {
        self.file.content.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.file.mime_type
    }

    fn last_modified(&self) -> SystemTime {
        self.file.last_modified
    }

    fn supports_direct_read(&self) -> bool {
        self.file.direct_read
    }

    fn read_direct(&self, mode: ReadMode) -> BoxFuture<'_, ReadOutcome> {
        self.record_read();
        Box::pin(async move {
            if !self.file.direct_read {
                return Err(PlatformError::other("direct read not supported"));
            }
            read_memory(&self.file, &self.full_path, mode).await
        })
    }

    fn start_read(&self, mode: ReadMode, completion: ReadCompletion) {
        self.record_read();
        let file = Arc::clone(&self.file);
        let full_path = self.full_path.clone();
        tokio::spawn(async move {
            if file.abandon_read {
                drop(completion);
                return;
            }
            let outcome = read_memory(&file, &full_path, mode).await;
            completion.complete(outcome);
        });
    }
}
