//! Directory identity tracking for symlink loop detection.

use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// On-disk identity of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirIdentity {
    /// (device, inode) pair, where the platform exposes one.
    Inode { device: u64, inode: u64 },
    /// Canonical path, everywhere else.
    Path(PathBuf),
}

impl DirIdentity {
    /// Identity of the directory at `path`, described by `metadata`.
    #[cfg(unix)]
    pub async fn of(_path: &Path, metadata: &std::fs::Metadata) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::Inode {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    pub async fn of(path: &Path, _metadata: &std::fs::Metadata) -> io::Result<Self> {
        Self::by_path(path).await
    }

    /// Identity from the canonical path, resolving every symlink on the way.
    pub async fn by_path(path: &Path) -> io::Result<Self> {
        tokio::fs::canonicalize(path).await.map(Self::Path)
    }
}

/// Directories already listed during one drop.
///
/// With symlink following enabled a directory can be reached through several
/// paths, or through itself. Shared by every listing of the drop.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    listed: DashSet<DirIdentity>,
}

impl VisitedDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a directory for listing. `false` if it was already claimed.
    pub fn claim(&self, identity: DirIdentity) -> bool {
        self.listed.insert(identity)
    }

    /// Number of distinct directories claimed.
    pub fn len(&self) -> usize {
        self.listed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let visited = VisitedDirs::new();
        let dir = DirIdentity::Inode { device: 1, inode: 42 };

        assert!(visited.claim(dir.clone()));
        assert!(!visited.claim(dir));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_same_inode_other_device() {
        let visited = VisitedDirs::new();
        assert!(visited.claim(DirIdentity::Inode { device: 1, inode: 42 }));
        assert!(visited.claim(DirIdentity::Inode { device: 2, inode: 42 }));
    }

    #[tokio::test]
    async fn test_identity_of_real_dir() {
        let temp = tempfile::tempdir().unwrap();
        let metadata = std::fs::metadata(temp.path()).unwrap();
        let a = DirIdentity::of(temp.path(), &metadata).await.unwrap();
        let b = DirIdentity::of(&temp.path().join("."), &metadata).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_path_identity_sees_through_aliases() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(docs.join("sub")).unwrap();

        let visited = VisitedDirs::new();
        assert!(visited.claim(DirIdentity::by_path(&docs).await.unwrap()));
        let alias = docs.join("sub").join("..");
        assert!(!visited.claim(DirIdentity::by_path(&alias).await.unwrap()));
    }
}
