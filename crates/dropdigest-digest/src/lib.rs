//! Per-file digest pipeline for dropdigest.
//!
//! This crate turns a flattened drop into report events:
//!
//! - **Materializing** - resolve each file entry and read its content through
//!   the direct or the event-driven read primitive
//! - **Hashing** - SHA-256 over the whole buffer, rendered as lowercase hex
//! - **Batch running** - one report event per file, in discovery order, with
//!   a bounded number of reads in flight
//! - **Sessions** - a single-flight gate so overlapping drops never
//!   interleave their reports
//!
//! # Example
//!
//! ```rust,ignore
//! use dropdigest_digest::{DropSession, TextSurface};
//! use dropdigest_scan::memory::{MemoryDir, MemoryFile, MemoryTree};
//!
//! let tree = MemoryTree::new().dir(
//!     MemoryDir::new("docs")
//!         .file(MemoryFile::new("a.txt", "hi"))
//!         .file(MemoryFile::new("b.txt", "")),
//! );
//!
//! let (session, mut rx) = DropSession::new(Default::default());
//! let mut surface = TextSurface::new();
//!
//! // The event channel is bounded: drain it while the drop runs.
//! let drain = async {
//!     while let Some(event) = rx.recv().await {
//!         surface.apply(&event);
//!         if event.is_finished() {
//!             break;
//!         }
//!     }
//! };
//! let (summary, ()) = tokio::join!(session.process(tree.entries()), drain);
//! summary?;
//! assert_eq!(surface.lines()[0], "2 files");
//! ```

mod hash;
mod materialize;
mod reader;
mod runner;
mod session;
mod surface;

pub use hash::{BLOCKING_THRESHOLD, digest_content, sha256};
pub use materialize::{FileMaterializer, Materialized};
pub use reader::{ContentReader, DirectReader, EventReader, select_reader};
pub use runner::BatchRunner;
pub use session::{DropSession, start_drop};
pub use surface::{TextSurface, render_event};

// Re-export core types
pub use dropdigest_core::{
    ContentHash, DigestError, DigestRecord, DropConfig, DropError, DropId, DropSummary,
    FileFailure, OverlapPolicy, ReportEvent,
};
