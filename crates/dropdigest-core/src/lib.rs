//! Core types for dropdigest.
//!
//! This crate holds the data structures shared by the scanning and digest
//! crates: content hashes, per-file records, report events, configuration
//! and the error and warning types.

mod config;
mod content;
mod error;
mod hash;
mod record;
mod report;

pub use config::{DropConfig, DropConfigBuilder, FsConfig, FsConfigBuilder, OverlapPolicy};
pub use content::{FileContent, ReadMode};
pub use error::{DigestError, DropError, DropWarning, PlatformError, WarningKind};
pub use hash::ContentHash;
pub use record::{DigestRecord, FileFailure};
pub use report::{DropId, DropSummary, ReportEvent};
