//! Draining a paginated directory listing.

use dropdigest_core::DropWarning;

use crate::entry::{DirectoryListing, Entry};

/// All children a listing produced, plus how it ended.
#[derive(Debug, Default)]
pub struct DirectoryContents {
    /// Children in platform order.
    pub entries: Vec<Entry>,
    /// Number of batch requests made (including the final empty or failed one).
    pub batches: usize,
    /// Set when a batch request failed and the listing was cut short.
    pub warning: Option<DropWarning>,
}

impl DirectoryContents {
    /// Check if the listing ended on a failed batch.
    pub fn is_partial(&self) -> bool {
        self.warning.is_some()
    }
}

/// Read every child of a directory by requesting batches until one is empty.
///
/// A failed batch ends enumeration for this directory only: the failure is
/// logged and the entries collected so far are returned.
pub async fn read_all_entries(listing: &mut dyn DirectoryListing, dir_path: &str) -> DirectoryContents {
    let mut contents = DirectoryContents::default();

    loop {
        contents.batches += 1;
        match listing.next_batch().await {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => contents.entries.extend(batch),
            Err(err) => {
                tracing::warn!(path = dir_path, error = %err, "directory listing failed");
                contents.warning = Some(DropWarning::listing_failed(dir_path, &err));
                break;
            }
        }
    }

    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDir, MemoryFile, MemoryTree};

    async fn list(tree: &MemoryTree) -> DirectoryContents {
        let payload = tree.entries();
        let Entry::Directory(dir) = &payload[0] else {
            panic!("expected a directory");
        };
        let mut listing = dir.create_reader();
        read_all_entries(listing.as_mut(), dir.full_path()).await
    }

    #[tokio::test]
    async fn test_concatenates_batches_in_order() {
        let tree = MemoryTree::new().dir(
            MemoryDir::new("docs")
                .batch_size(1)
                .file(MemoryFile::new("A", "a"))
                .file(MemoryFile::new("B", "b"))
                .file(MemoryFile::new("C", "c")),
        );

        let contents = list(&tree).await;
        let names: Vec<_> = contents.entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        // three full batches, then the empty one
        assert_eq!(contents.batches, 4);
        assert!(!contents.is_partial());
    }

    #[tokio::test]
    async fn test_first_batch_failure_yields_nothing() {
        let tree = MemoryTree::new().dir(
            MemoryDir::new("docs")
                .fail_batch(0)
                .file(MemoryFile::new("A", "a")),
        );

        let contents = list(&tree).await;
        assert!(contents.entries.is_empty());
        assert!(contents.is_partial());
        let warning = contents.warning.unwrap();
        assert_eq!(warning.path, "/docs");
    }

    #[tokio::test]
    async fn test_later_failure_keeps_collected_entries() {
        let tree = MemoryTree::new().dir(
            MemoryDir::new("docs")
                .batch_size(2)
                .fail_batch(1)
                .file(MemoryFile::new("A", "a"))
                .file(MemoryFile::new("B", "b"))
                .file(MemoryFile::new("C", "c")),
        );

        let contents = list(&tree).await;
        let names: Vec<_> = contents.entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["A", "B"]);
        assert!(contents.is_partial());
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let tree = MemoryTree::new().dir(MemoryDir::new("empty"));
        let contents = list(&tree).await;
        assert!(contents.entries.is_empty());
        assert_eq!(contents.batches, 1);
    }
}
