//! Per-file report records.

use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Digest of one file, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    /// Position of the file in the flat file list.
    pub index: usize,
    /// File name (not full path).
    pub name: CompactString,
    /// Full path inside the drop, `/`-rooted.
    pub full_path: String,
    /// Size in bytes as reported by the file object.
    pub size: u64,
    /// MIME type hint (empty when unknown).
    pub mime_type: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// SHA-256 of the content.
    pub digest: ContentHash,
}

impl DigestRecord {
    /// Create a new record.
    pub fn new(
        index: usize,
        name: impl Into<CompactString>,
        full_path: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        last_modified: SystemTime,
        digest: ContentHash,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            full_path: full_path.into(),
            size,
            mime_type: mime_type.into(),
            last_modified: last_modified.into(),
            digest,
        }
    }
}

/// Renders `<name> - <full_path> - <size> bytes - <hex digest>`.
impl fmt::Display for DigestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} bytes - {}",
            self.name, self.full_path, self.size, self.digest
        )
    }
}

/// A file whose pipeline failed; reported in place of its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Position of the file in the flat file list.
    pub index: usize,
    pub name: CompactString,
    pub full_path: String,
    /// Human-readable error message.
    pub message: String,
}

impl FileFailure {
    /// Create a new failure record.
    pub fn new(
        index: usize,
        name: impl Into<CompactString>,
        full_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            full_path: full_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - error: {}", self.name, self.full_path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_line() {
        let record = DigestRecord::new(
            0,
            "a.txt",
            "/docs/a.txt",
            2,
            "text/plain",
            SystemTime::UNIX_EPOCH,
            ContentHash::new([0x11; 32]),
        );
        assert_eq!(
            record.to_string(),
            format!("a.txt - /docs/a.txt - 2 bytes - {}", "11".repeat(32))
        );
    }

    #[test]
    fn test_failure_line() {
        let failure = FileFailure::new(3, "b.txt", "/docs/b.txt", "Permission denied");
        assert_eq!(
            failure.to_string(),
            "b.txt - /docs/b.txt - error: Permission denied"
        );
    }
}
