//! Platform interface for dropped entries.
//!
//! A backend (local filesystem, in-memory tree, ...) exposes the items of a
//! drop as [`Entry`] values. Directories are listed through a paginated
//! [`DirectoryListing`]; files resolve to a [`FileObject`] that can be read
//! either directly or through a single-shot [`ReadCompletion`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::SystemTime;

use tokio::sync::oneshot;

use dropdigest_core::{FileContent, PlatformError, ReadMode};

/// Type alias for boxed futures returned by async platform methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a single read.
pub type ReadOutcome = Result<FileContent, PlatformError>;

/// Paginated listing of a directory's immediate children.
pub trait DirectoryListing: Send {
    /// Request the next batch of children.
    ///
    /// An empty batch means the listing is exhausted.
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Vec<Entry>, PlatformError>>;
}

/// A file inside a drop.
pub trait FileEntry: Send + Sync {
    /// File name (not full path).
    fn name(&self) -> &str;

    /// Full path inside the drop, `/`-rooted.
    fn full_path(&self) -> &str;

    /// Resolve the entry to a readable file object.
    fn resolve(&self) -> BoxFuture<'_, Result<Box<dyn FileObject>, PlatformError>>;
}

/// A directory inside a drop.
pub trait DirectoryEntry: Send + Sync {
    /// Directory name (not full path).
    fn name(&self) -> &str;

    /// Full path inside the drop, `/`-rooted.
    fn full_path(&self) -> &str;

    /// Create a fresh listing of the directory's children.
    fn create_reader(&self) -> Box<dyn DirectoryListing>;
}

/// A resolved file: metadata plus one or both read primitives.
pub trait FileObject: Send + Sync {
    /// Size in bytes.
    fn size(&self) -> u64;

    /// MIME type hint, empty when unknown.
    fn mime_type(&self) -> &str;

    /// Last modification time.
    fn last_modified(&self) -> SystemTime;

    /// Whether [`FileObject::read_direct`] is available.
    fn supports_direct_read(&self) -> bool {
        false
    }

    /// Read the whole file in one call.
    fn read_direct(&self, _mode: ReadMode) -> BoxFuture<'_, ReadOutcome> {
        Box::pin(async { Err(PlatformError::other("direct read not supported")) })
    }

    /// Start an event-driven read that reports through `completion`.
    fn start_read(&self, mode: ReadMode, completion: ReadCompletion);
}

/// Single-shot completion handle for an event-driven read.
///
/// Consumed by exactly one of [`ReadCompletion::load`] or
/// [`ReadCompletion::fail`]. Dropping it without either closes the channel,
/// which the waiting side observes as an abandoned read.
#[derive(Debug)]
pub struct ReadCompletion {
    tx: oneshot::Sender<ReadOutcome>,
}

impl ReadCompletion {
    /// Create a completion handle and the receiver awaiting its outcome.
    pub fn channel() -> (Self, oneshot::Receiver<ReadOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report a successful read.
    pub fn load(self, content: FileContent) {
        self.complete(Ok(content));
    }

    /// Report a failed read.
    pub fn fail(self, error: PlatformError) {
        self.complete(Err(error));
    }

    /// Report either outcome.
    pub fn complete(self, outcome: ReadOutcome) {
        // The reader may have given up waiting; nothing to do then.
        let _ = self.tx.send(outcome);
    }
}

/// A file or directory in a drop.
pub enum Entry {
    File(Box<dyn FileEntry>),
    Directory(Box<dyn DirectoryEntry>),
}

impl Entry {
    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    /// Check if this is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    /// Entry name (not full path).
    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => file.name(),
            Entry::Directory(dir) => dir.name(),
        }
    }

    /// Full path inside the drop.
    pub fn full_path(&self) -> &str {
        match self {
            Entry::File(file) => file.full_path(),
            Entry::Directory(dir) => dir.full_path(),
        }
    }

    /// Borrow the file handle, if this is a file.
    pub fn as_file(&self) -> Option<&dyn FileEntry> {
        match self {
            Entry::File(file) => Some(file.as_ref()),
            Entry::Directory(_) => None,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_file() { "File" } else { "Directory" };
        f.debug_struct(kind)
            .field("name", &self.name())
            .field("full_path", &self.full_path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_delivers_once() {
        let (completion, rx) = ReadCompletion::channel();
        completion.load(FileContent::Bytes(b"hi".to_vec()));

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.unwrap(), FileContent::Bytes(b"hi".to_vec()));
    }

    #[tokio::test]
    async fn test_dropped_completion_closes_channel() {
        let (completion, rx) = ReadCompletion::channel();
        drop(completion);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_failed_completion() {
        let (completion, rx) = ReadCompletion::channel();
        completion.fail(PlatformError::other("Problem parsing file."));
        assert!(rx.await.unwrap().is_err());
    }
}
