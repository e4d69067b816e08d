//! Turning a file entry into its content.

use chrono::{DateTime, Utc};

use dropdigest_core::{DigestError, FileContent, ReadMode};
use dropdigest_scan::{FileEntry, FileObject};

use crate::reader::select_reader;

/// A resolved file together with its full content.
pub struct Materialized {
    pub object: Box<dyn FileObject>,
    pub content: FileContent,
}

/// Resolves file entries and reads them with whichever primitive they offer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileMaterializer;

impl FileMaterializer {
    /// Create a new materializer.
    pub fn new() -> Self {
        Self
    }

    /// Resolve an entry to a file object.
    pub async fn resolve(&self, file: &dyn FileEntry) -> Result<Box<dyn FileObject>, DigestError> {
        match file.resolve().await {
            Ok(object) => {
                log_file_info(file.full_path(), object.as_ref());
                Ok(object)
            }
            Err(source) => {
                tracing::warn!(path = file.full_path(), error = %source, "could not resolve file");
                Err(DigestError::Resolve {
                    path: file.full_path().to_string(),
                    source,
                })
            }
        }
    }

    /// Read the full content of a resolved file.
    pub async fn read(
        &self,
        object: &dyn FileObject,
        path: &str,
        mode: ReadMode,
    ) -> Result<FileContent, DigestError> {
        let reader = select_reader(object);
        tracing::trace!(path, strategy = reader.name(), "reading file");
        reader.read(object, path, mode).await
    }

    /// Resolve and read in one step.
    pub async fn materialize(
        &self,
        file: &dyn FileEntry,
        mode: ReadMode,
    ) -> Result<Materialized, DigestError> {
        let object = self.resolve(file).await?;
        let content = self.read(object.as_ref(), file.full_path(), mode).await?;
        Ok(Materialized { object, content })
    }
}

fn log_file_info(path: &str, object: &dyn FileObject) {
    let modified: DateTime<Utc> = object.last_modified().into();
    tracing::debug!(
        path,
        size = object.size(),
        mime_type = object.mime_type(),
        last_modified = %modified.to_rfc3339(),
        "file resolved"
    );
}
