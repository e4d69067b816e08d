//! Report events emitted while a drop is processed.

use std::fmt;
use std::time::Duration;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::DropWarning;
use crate::record::{DigestRecord, FileFailure};

/// Identifier of one drop within a session, increasing from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DropId(pub u64);

impl DropId {
    /// Create a new DropId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Summary of a finished drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSummary {
    pub drop_id: Option<DropId>,
    /// Number of entries in the flat file list.
    pub files_total: usize,
    /// Files that produced a digest record.
    pub files_reported: usize,
    /// Files whose pipeline failed.
    pub files_failed: usize,
    /// Non-file entries skipped.
    pub entries_skipped: usize,
    /// Total bytes digested.
    pub bytes_hashed: u64,
    /// Warnings collected during traversal and processing.
    pub warnings: Vec<DropWarning>,
    /// Time spent on the drop.
    pub elapsed: Duration,
}

impl DropSummary {
    /// Check if every file produced a record.
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One step of a drop's report, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportEvent {
    /// A drop started; the display is cleared and the file count shown.
    Started { drop_id: DropId, file_count: usize },
    /// A file was digested.
    Record { drop_id: DropId, record: DigestRecord },
    /// A file could not be digested.
    Failed { drop_id: DropId, failure: FileFailure },
    /// A non-file entry was found in the file list.
    Skipped {
        drop_id: DropId,
        index: usize,
        name: CompactString,
    },
    /// The drop finished.
    Finished(DropSummary),
}

impl ReportEvent {
    /// The drop this event belongs to.
    pub fn drop_id(&self) -> Option<DropId> {
        match self {
            Self::Started { drop_id, .. }
            | Self::Record { drop_id, .. }
            | Self::Failed { drop_id, .. }
            | Self::Skipped { drop_id, .. } => Some(*drop_id),
            Self::Finished(summary) => summary.drop_id,
        }
    }

    /// Check if this event ends a drop.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}
