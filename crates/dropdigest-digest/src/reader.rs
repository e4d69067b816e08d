//! Read strategies over a resolved file.
//!
//! A [`FileObject`] may expose a direct read, an event-driven read, or both.
//! Callers never pick one themselves; [`select_reader`] checks the object and
//! hands back the strategy to use. Both present the same awaitable contract.

use dropdigest_core::{DigestError, FileContent, ReadMode};
use dropdigest_scan::{BoxFuture, FileObject, ReadCompletion};

/// Awaitable read of a whole file.
pub trait ContentReader: Send + Sync {
    /// Strategy name, for logging.
    fn name(&self) -> &'static str;

    /// Read the file's full content.
    ///
    /// `path` is only used for error context.
    fn read<'a>(
        &'a self,
        file: &'a dyn FileObject,
        path: &'a str,
        mode: ReadMode,
    ) -> BoxFuture<'a, Result<FileContent, DigestError>>;
}

/// Reads through [`FileObject::read_direct`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectReader;

impl ContentReader for DirectReader {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn read<'a>(
        &'a self,
        file: &'a dyn FileObject,
        path: &'a str,
        mode: ReadMode,
    ) -> BoxFuture<'a, Result<FileContent, DigestError>> {
        Box::pin(async move {
            file.read_direct(mode)
                .await
                .map_err(|source| DigestError::Read {
                    path: path.to_string(),
                    source,
                })
        })
    }
}

/// Reads through [`FileObject::start_read`], awaiting the single completion.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventReader;

impl ContentReader for EventReader {
    fn name(&self) -> &'static str {
        "event"
    }

    fn read<'a>(
        &'a self,
        file: &'a dyn FileObject,
        path: &'a str,
        mode: ReadMode,
    ) -> BoxFuture<'a, Result<FileContent, DigestError>> {
        let (completion, rx) = ReadCompletion::channel();
        file.start_read(mode, completion);

        Box::pin(async move {
            match rx.await {
                Ok(Ok(content)) => Ok(content),
                Ok(Err(source)) => Err(DigestError::Read {
                    path: path.to_string(),
                    source,
                }),
                Err(_) => Err(DigestError::ReaderDropped {
                    path: path.to_string(),
                }),
            }
        })
    }
}

static DIRECT: DirectReader = DirectReader;
static EVENT: EventReader = EventReader;

/// Pick the read strategy a file object supports, preferring the direct one.
pub fn select_reader(file: &dyn FileObject) -> &'static dyn ContentReader {
    if file.supports_direct_read() {
        &DIRECT
    } else {
        &EVENT
    }
}
