//! Per-file pipeline over a flattened drop.

use std::time::Instant;

use compact_str::CompactString;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use dropdigest_core::{
    DigestError, DigestRecord, DropConfig, DropError, DropId, DropSummary, DropWarning,
    FileFailure, ReadMode, ReportEvent,
};
use dropdigest_scan::{Entry, FileEntry, FlatFileList};

use crate::hash::digest_content;
use crate::materialize::FileMaterializer;

/// What happened to one entry of the flat list.
enum FileOutcome {
    Digested(DigestRecord),
    Failed(FileFailure),
    Skipped {
        index: usize,
        name: CompactString,
        full_path: String,
    },
}

/// Runs the read, hash and report pipeline for every file of a drop.
///
/// Up to `max_concurrent_reads` files are in flight at once, but their
/// events are always emitted in flat-list order.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: DropConfig,
    materializer: FileMaterializer,
}

impl BatchRunner {
    /// Create a runner with the given configuration.
    pub fn new(config: DropConfig) -> Self {
        Self {
            config,
            materializer: FileMaterializer::new(),
        }
    }

    /// Process a flat file list, sending one event per entry.
    ///
    /// Per-file failures become [`ReportEvent::Failed`] and never stop the
    /// batch. Only a closed report channel does.
    pub async fn run(
        &self,
        drop_id: DropId,
        flat: FlatFileList,
        tx: &mpsc::Sender<ReportEvent>,
    ) -> Result<DropSummary, DropError> {
        let start = Instant::now();
        let mut summary = DropSummary {
            drop_id: Some(drop_id),
            files_total: flat.len(),
            warnings: flat.warnings,
            ..Default::default()
        };

        send(
            tx,
            ReportEvent::Started {
                drop_id,
                file_count: summary.files_total,
            },
        )
        .await?;

        let in_flight = self.config.max_concurrent_reads.max(1);
        let mut outcomes = stream::iter(flat.files.into_iter().enumerate())
            .map(|(index, entry)| self.process_entry(index, entry))
            .buffered(in_flight);

        while let Some(outcome) = outcomes.next().await {
            let event = match outcome {
                FileOutcome::Digested(record) => {
                    summary.files_reported += 1;
                    summary.bytes_hashed += record.size;
                    ReportEvent::Record { drop_id, record }
                }
                FileOutcome::Failed(failure) => {
                    summary.files_failed += 1;
                    ReportEvent::Failed { drop_id, failure }
                }
                FileOutcome::Skipped {
                    index,
                    name,
                    full_path,
                } => {
                    summary.entries_skipped += 1;
                    summary.warnings.push(DropWarning::not_a_file(full_path, index));
                    ReportEvent::Skipped {
                        drop_id,
                        index,
                        name,
                    }
                }
            };
            send(tx, event).await?;
        }

        summary.elapsed = start.elapsed();
        send(tx, ReportEvent::Finished(summary.clone())).await?;
        Ok(summary)
    }

    async fn process_entry(&self, index: usize, entry: Entry) -> FileOutcome {
        let Some(file) = entry.as_file() else {
            tracing::warn!(index, path = entry.full_path(), "skipping non file item");
            return FileOutcome::Skipped {
                index,
                name: entry.name().into(),
                full_path: entry.full_path().to_string(),
            };
        };

        match self.digest_file(index, file).await {
            Ok(record) => FileOutcome::Digested(record),
            Err(err) => {
                tracing::warn!(path = file.full_path(), error = %err, "file failed");
                FileOutcome::Failed(FileFailure::new(
                    index,
                    file.name(),
                    file.full_path(),
                    err.to_string(),
                ))
            }
        }
    }

    async fn digest_file(&self, index: usize, file: &dyn FileEntry) -> Result<DigestRecord, DigestError> {
        let materialized = self.materializer.materialize(file, ReadMode::Binary).await?;
        let object = materialized.object;
        let digest = digest_content(file.full_path(), materialized.content).await?;

        Ok(DigestRecord::new(
            index,
            file.name(),
            file.full_path(),
            object.size(),
            object.mime_type(),
            object.last_modified(),
            digest,
        ))
    }
}

async fn send(tx: &mpsc::Sender<ReportEvent>, event: ReportEvent) -> Result<(), DropError> {
    tx.send(event).await.map_err(|_| DropError::ChannelClosed)
}
