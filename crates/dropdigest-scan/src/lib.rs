//! Drop payload traversal for dropdigest.
//!
//! This crate defines the platform interface a drop is made of (entries,
//! directory listings, file objects) and the breadth-first traversal that
//! flattens a drop into an ordered list of files.
//!
//! # Overview
//!
//! - **Platform traits** in [`entry`]: a backend hands out [`Entry`] values
//!   and answers paginated directory listings and file reads asynchronously.
//! - **Entry enumeration**: [`read_all_entries`] drains one listing batch by
//!   batch.
//! - **Flattening**: [`TreeFlattener`] visits the drop breadth-first and
//!   returns the files in discovery order.
//! - **Backends**: [`fs`] reads the local filesystem, [`memory`] serves a
//!   scripted tree with injectable failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use dropdigest_scan::{FsConfig, TreeFlattener, fs::FsDrop};
//!
//! # async fn run() -> Result<(), dropdigest_scan::PlatformError> {
//! let drop = FsDrop::new(FsConfig::default());
//! let payload = drop.entries(&["./docs".into()]).await?;
//!
//! let flat = TreeFlattener::new().flatten(payload).await;
//! println!("{} files", flat.len());
//! # Ok(())
//! # }
//! ```

pub mod entry;
mod enumerate;
mod flatten;
pub mod fs;
pub mod memory;
mod progress;
mod visited;

pub use entry::{
    BoxFuture, DirectoryEntry, DirectoryListing, Entry, FileEntry, FileObject, ReadCompletion,
    ReadOutcome,
};
pub use enumerate::{DirectoryContents, read_all_entries};
pub use flatten::{FlatFileList, TraversalStats, TreeFlattener};
pub use visited::{DirIdentity, VisitedDirs};
pub use progress::ScanProgress;

// Re-export core types for convenience
pub use dropdigest_core::{
    DropWarning, FileContent, FsConfig, PlatformError, ReadMode, WarningKind,
};
