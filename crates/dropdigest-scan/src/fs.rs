//! Local filesystem drop backend.
//!
//! Each path handed to [`FsDrop::entries`] becomes one top-level entry, the
//! way dragging items from a file manager does. Full paths are rooted at the
//! dropped item: dropping `~/work/docs` yields `/docs`, `/docs/a.txt`, ...

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use dropdigest_core::{DropWarning, FileContent, FsConfig, PlatformError, ReadMode, WarningKind};

use crate::entry::{
    BoxFuture, DirectoryEntry, DirectoryListing, Entry, FileEntry, FileObject, ReadCompletion,
    ReadOutcome,
};
use crate::visited::{DirIdentity, VisitedDirs};

/// State shared by every entry of one filesystem drop.
#[derive(Debug)]
struct FsContext {
    config: FsConfig,
    visited: VisitedDirs,
    warnings: Mutex<Vec<DropWarning>>,
}

impl FsContext {
    fn warn(&self, warning: DropWarning) {
        tracing::warn!(path = %warning.path, "{}", warning.message);
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning);
        }
    }
}

/// A drop made of local filesystem paths.
#[derive(Debug, Clone)]
pub struct FsDrop {
    ctx: Arc<FsContext>,
}

impl FsDrop {
    /// Create a new filesystem drop.
    pub fn new(config: FsConfig) -> Self {
        Self {
            ctx: Arc::new(FsContext {
                config,
                visited: VisitedDirs::new(),
                warnings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Turn dropped paths into top-level entries, in the given order.
    ///
    /// Fails if a path does not exist or is neither a file nor a directory.
    pub async fn entries(&self, paths: &[PathBuf]) -> Result<Vec<Entry>, PlatformError> {
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let display = path.display().to_string();
            let canonical = tokio::fs::canonicalize(path)
                .await
                .map_err(|e| PlatformError::io(&display, e))?;
            let name = canonical
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| canonical.to_string_lossy().to_string());
            let metadata = tokio::fs::metadata(&canonical)
                .await
                .map_err(|e| PlatformError::io(&display, e))?;

            let full_path = format!("/{}", name.trim_start_matches('/'));
            match classify(&self.ctx, canonical, name, full_path, &metadata) {
                Some(entry) => entries.push(entry),
                None => {
                    return Err(PlatformError::other(format!(
                        "{display} is neither a file nor a directory"
                    )));
                }
            }
        }
        Ok(entries)
    }

    /// Warnings collected while listing (skipped or revisited entries).
    pub fn warnings(&self) -> Vec<DropWarning> {
        self.ctx
            .warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

/// Build an entry from resolved metadata, `None` for unsupported types.
fn classify(
    ctx: &Arc<FsContext>,
    path: PathBuf,
    name: String,
    full_path: String,
    metadata: &std::fs::Metadata,
) -> Option<Entry> {
    if metadata.is_dir() {
        Some(Entry::Directory(Box::new(FsDirEntry {
            name,
            full_path,
            path,
            ctx: Arc::clone(ctx),
        })))
    } else if metadata.is_file() {
        Some(Entry::File(Box::new(FsFileEntry {
            name,
            full_path,
            path,
        })))
    } else {
        None
    }
}

struct FsFileEntry {
    name: String,
    full_path: String,
    path: PathBuf,
}

impl FileEntry for FsFileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn resolve(&self) -> BoxFuture<'_, Result<Box<dyn FileObject>, PlatformError>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&self.path)
                .await
                .map_err(|e| PlatformError::io(&self.full_path, e))?;
            if !metadata.is_file() {
                return Err(PlatformError::other(format!(
                    "{} is no longer a regular file",
                    self.full_path
                )));
            }
            Ok(Box::new(FsFileObject {
                path: self.path.clone(),
                full_path: self.full_path.clone(),
                size: metadata.len(),
                mime_type: guess_mime_type(&self.name),
                last_modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            }) as Box<dyn FileObject>)
        })
    }
}

struct FsDirEntry {
    name: String,
    full_path: String,
    path: PathBuf,
    ctx: Arc<FsContext>,
}

impl DirectoryEntry for FsDirEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn create_reader(&self) -> Box<dyn DirectoryListing> {
        Box::new(FsListing {
            path: self.path.clone(),
            full_path: self.full_path.clone(),
            ctx: Arc::clone(&self.ctx),
            state: ListingState::Pending,
        })
    }
}

enum ListingState {
    Pending,
    Open(tokio::fs::ReadDir),
    Done,
}

struct FsListing {
    path: PathBuf,
    full_path: String,
    ctx: Arc<FsContext>,
    state: ListingState,
}

impl FsListing {
    /// Open the directory, unless it was already listed during this drop.
    async fn open(&mut self) -> Result<(), PlatformError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| PlatformError::io(&self.full_path, e))?;

        let identity = DirIdentity::of(&self.path, &metadata)
            .await
            .map_err(|e| PlatformError::io(&self.full_path, e))?;
        if !self.ctx.visited.claim(identity) {
            self.ctx.warn(DropWarning::new(
                &self.full_path,
                "Directory already listed, skipping",
                WarningKind::AlreadyVisited,
            ));
            self.state = ListingState::Done;
            return Ok(());
        }

        let read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| PlatformError::io(&self.full_path, e))?;
        self.state = ListingState::Open(read_dir);
        Ok(())
    }
}

/// Convert one raw directory entry, `None` when it is skipped.
///
/// Failures specific to this child become warnings so its siblings are
/// still listed.
async fn convert(
    ctx: &Arc<FsContext>,
    parent_path: &str,
    dir_entry: tokio::fs::DirEntry,
) -> Option<Entry> {
    let name = dir_entry.file_name().to_string_lossy().to_string();
    let full_path = format!("{parent_path}/{name}");

    if ctx.config.should_skip_hidden(&name) {
        return None;
    }

    let unreadable = |err: std::io::Error| {
        ctx.warn(DropWarning::new(
            &full_path,
            format!("Could not read metadata: {err}"),
            WarningKind::Unreadable,
        ));
    };

    let path = dir_entry.path();
    let file_type = match dir_entry.file_type().await {
        Ok(file_type) => file_type,
        Err(err) => {
            unreadable(err);
            return None;
        }
    };

    let metadata = if file_type.is_symlink() {
        if !ctx.config.follow_symlinks {
            tracing::debug!(path = %full_path, "skipping symlink");
            return None;
        }
        match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(err) => {
                ctx.warn(DropWarning::new(
                    &full_path,
                    format!("Broken symlink: {err}"),
                    WarningKind::Unsupported,
                ));
                return None;
            }
        }
    } else {
        match dir_entry.metadata().await {
            Ok(m) => m,
            Err(err) => {
                unreadable(err);
                return None;
            }
        }
    };

    let entry = classify(ctx, path, name, full_path.clone(), &metadata);
    if entry.is_none() {
        ctx.warn(DropWarning::new(
            &full_path,
            "Not a regular file or directory",
            WarningKind::Unsupported,
        ));
    }
    entry
}

impl DirectoryListing for FsListing {
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Vec<Entry>, PlatformError>> {
        Box::pin(async move {
            if matches!(self.state, ListingState::Pending) {
                self.open().await?;
            }

            let mut batch = Vec::new();
            while batch.len() < self.ctx.config.batch_size {
                let ListingState::Open(read_dir) = &mut self.state else {
                    break;
                };
                let next = read_dir
                    .next_entry()
                    .await
                    .map_err(|e| PlatformError::io(&self.full_path, e))?;
                match next {
                    Some(dir_entry) => {
                        if let Some(entry) = convert(&self.ctx, &self.full_path, dir_entry).await {
                            batch.push(entry);
                        }
                    }
                    None => self.state = ListingState::Done,
                }
            }
            Ok(batch)
        })
    }
}

struct FsFileObject {
    path: PathBuf,
    full_path: String,
    size: u64,
    mime_type: String,
    last_modified: SystemTime,
}

async fn read_file(path: &Path, full_path: &str, mode: ReadMode) -> ReadOutcome {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PlatformError::io(full_path, e))?;
    FileContent::from_bytes(bytes, mode).map_err(|_| PlatformError::InvalidText {
        path: full_path.to_string(),
    })
}

impl FileObject for FsFileObject {
    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    fn supports_direct_read(&self) -> bool {
        true
    }

    fn read_direct(&self, mode: ReadMode) -> BoxFuture<'_, ReadOutcome> {
        Box::pin(read_file(&self.path, &self.full_path, mode))
    }

    fn start_read(&self, mode: ReadMode, completion: ReadCompletion) {
        let path = self.path.clone();
        let full_path = self.full_path.clone();
        tokio::spawn(async move {
            completion.complete(read_file(&path, &full_path, mode).await);
        });
    }
}

/// MIME type hint from the file extension, empty when unknown.
pub fn guess_mime_type(name: &str) -> String {
    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return String::new(),
    };
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.txt"), "text/plain");
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("Makefile"), "");
        assert_eq!(guess_mime_type(".bashrc"), "");
        assert_eq!(guess_mime_type("archive.unknown"), "");
    }

    #[tokio::test]
    async fn test_top_level_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("note.txt"), "hi").unwrap();

        let drop = FsDrop::new(FsConfig::default());
        let entries = drop
            .entries(&[temp.path().join("note.txt"), temp.path().join("docs")])
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_file());
        assert_eq!(entries[0].full_path(), "/note.txt");
        assert!(entries[1].is_directory());
        assert_eq!(entries[1].full_path(), "/docs");
    }

    #[tokio::test]
    async fn test_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let drop = FsDrop::new(FsConfig::default());
        let result = drop.entries(&[temp.path().join("nope")]).await;
        assert!(matches!(result, Err(PlatformError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_listing_respects_batch_size() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        for i in 0..5 {
            fs::write(docs.join(format!("{i}.txt")), "x").unwrap();
        }

        let config = FsConfig::builder().batch_size(2usize).build().unwrap();
        let drop = FsDrop::new(config);
        let entries = drop.entries(&[docs]).await.unwrap();
        let Entry::Directory(dir) = &entries[0] else {
            panic!("expected a directory");
        };

        let mut listing = dir.create_reader();
        let mut sizes = Vec::new();
        loop {
            let batch = listing.next_batch().await.unwrap();
            if batch.is_empty() {
                break;
            }
            assert!(batch.iter().all(|e| e.full_path().starts_with("/docs/")));
            sizes.push(batch.len());
        }
        assert_eq!(sizes, [2, 2, 1]);
    }

    #[tokio::test]
    async fn test_hidden_entries_skipped() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join(".hidden"), "x").unwrap();
        fs::write(docs.join("shown"), "x").unwrap();

        let config = FsConfig::builder().include_hidden(false).build().unwrap();
        let drop = FsDrop::new(config);
        let entries = drop.entries(&[docs]).await.unwrap();
        let Entry::Directory(dir) = &entries[0] else {
            panic!("expected a directory");
        };

        let batch = dir.create_reader().next_batch().await.unwrap();
        let names: Vec<_> = batch.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["shown"]);
    }

    #[tokio::test]
    async fn test_file_object_reads() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "hi").unwrap();

        let drop = FsDrop::new(FsConfig::default());
        let entries = drop.entries(&[temp.path().join("a.txt")]).await.unwrap();
        let object = entries[0].as_file().unwrap().resolve().await.unwrap();

        assert_eq!(object.size(), 2);
        assert_eq!(object.mime_type(), "text/plain");
        assert!(object.supports_direct_read());
        assert_eq!(
            object.read_direct(ReadMode::Binary).await.unwrap(),
            FileContent::Bytes(b"hi".to_vec())
        );

        let (completion, rx) = ReadCompletion::channel();
        object.start_read(ReadMode::Text, completion);
        assert_eq!(rx.await.unwrap().unwrap(), FileContent::Text("hi".into()));
    }

    // Linux directory streams buffer names ahead of the caller, so a file
    // removed after the first batch is still returned by the stream but
    // can no longer be stat'ed.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_vanished_child_does_not_hide_siblings() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        for name in ["a", "b", "c", "d"] {
            fs::write(docs.join(name), "x").unwrap();
        }

        let config = FsConfig::builder().batch_size(1usize).build().unwrap();
        let drop = FsDrop::new(config);
        let entries = drop.entries(&[docs.clone()]).await.unwrap();
        let Entry::Directory(dir) = &entries[0] else {
            panic!("expected a directory");
        };

        let mut listing = dir.create_reader();
        let first = listing.next_batch().await.unwrap();
        let first_name = first[0].name().to_string();
        let victim = ["a", "b", "c", "d"]
            .into_iter()
            .find(|n| *n != first_name)
            .unwrap();
        fs::remove_file(docs.join(victim)).unwrap();

        let mut rest = Vec::new();
        loop {
            let batch = listing.next_batch().await.unwrap();
            if batch.is_empty() {
                break;
            }
            rest.extend(batch.iter().map(|e| e.name().to_string()));
        }

        assert_eq!(rest.len(), 2);
        assert!(!rest.iter().any(|n| n == victim));

        let warnings = drop.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Unreadable);
        assert_eq!(warnings[0].path, format!("/docs/{victim}"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loop_listed_once() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        std::os::unix::fs::symlink(&docs, docs.join("again")).unwrap();

        let config = FsConfig::builder().follow_symlinks(true).build().unwrap();
        let drop = FsDrop::new(config);
        let entries = drop.entries(&[docs]).await.unwrap();
        let flat = crate::TreeFlattener::new().flatten(entries).await;

        assert!(flat.is_empty());
        assert_eq!(flat.stats.directories, 2);
        let warnings = drop.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::AlreadyVisited);
        assert_eq!(warnings[0].path, "/docs/again");
    }
}
