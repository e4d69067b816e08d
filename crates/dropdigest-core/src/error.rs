//! Error and warning types for drop processing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a platform backend (listing, resolving or reading).
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Permission denied for an entry.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Entry no longer exists.
    #[error("Entry not found: {path}")]
    NotFound { path: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Text was requested but the content is not UTF-8.
    #[error("Problem parsing file: {path} is not valid UTF-8 text")]
    InvalidText { path: String },

    /// Backend-specific failure.
    #[error("{message}")]
    Other { message: String },
}

impl PlatformError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a backend-specific error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Failure of the per-file pipeline (resolve, read, digest).
#[derive(Debug, Error)]
pub enum DigestError {
    /// The file entry could not be turned into a file object.
    #[error("Could not resolve {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: PlatformError,
    },

    /// Reading the file content failed.
    #[error("Problem reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: PlatformError,
    },

    /// An event-driven read was abandoned without reporting an outcome.
    #[error("Reader for {path} finished without a result")]
    ReaderDropped { path: String },

    /// The hashing task did not complete.
    #[error("Hashing {path} failed: {message}")]
    Hash { path: String, message: String },
}

impl DigestError {
    /// Full path of the entry the failure belongs to.
    pub fn path(&self) -> &str {
        match self {
            Self::Resolve { path, .. }
            | Self::Read { path, .. }
            | Self::ReaderDropped { path }
            | Self::Hash { path, .. } => path,
        }
    }
}

/// Errors that stop a whole drop.
#[derive(Debug, Error)]
pub enum DropError {
    /// Another drop is in flight and the session rejects overlaps.
    #[error("Another drop is already being processed")]
    Busy,

    /// The report receiver went away.
    #[error("Report receiver closed, drop abandoned")]
    ChannelClosed,
}

/// Kind of drop warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory batch request failed; the listing was cut short.
    ListingFailed,
    /// A non-file entry showed up where a file was expected.
    NotAFile,
    /// Entry type the backend cannot represent (sockets, devices, ...).
    Unsupported,
    /// Directory already visited through another path (symlink loop).
    AlreadyVisited,
    /// Entry vanished or its metadata could not be read while listing.
    Unreadable,
}

/// Non-fatal warning encountered while processing a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropWarning {
    /// Full path where the warning occurred.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl DropWarning {
    /// Create a new drop warning.
    pub fn new(path: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a listing failure warning.
    pub fn listing_failed(path: impl Into<String>, error: &PlatformError) -> Self {
        Self::new(path, format!("Listing failed: {error}"), WarningKind::ListingFailed)
    }

    /// Create a warning for a non-file entry in the file list.
    pub fn not_a_file(path: impl Into<String>, index: usize) -> Self {
        Self::new(
            path,
            format!("Skipping non file item at index {index}"),
            WarningKind::NotAFile,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_io() {
        let err = PlatformError::io(
            "/docs/a.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, PlatformError::PermissionDenied { .. }));

        let err = PlatformError::io(
            "/docs/a.txt",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short"),
        );
        assert!(matches!(err, PlatformError::Io { .. }));
    }

    #[test]
    fn test_digest_error_path() {
        let err = DigestError::Resolve {
            path: "/docs/a.txt".into(),
            source: PlatformError::other("gone"),
        };
        assert_eq!(err.path(), "/docs/a.txt");
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_listing_warning() {
        let warning = DropWarning::listing_failed("/docs", &PlatformError::other("boom"));
        assert_eq!(warning.kind, WarningKind::ListingFailed);
        assert!(warning.message.contains("boom"));
    }
}
