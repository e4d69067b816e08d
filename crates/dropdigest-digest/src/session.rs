//! Single-flight drop sessions.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast, mpsc};

use dropdigest_core::{DropConfig, DropError, DropId, DropSummary, OverlapPolicy, ReportEvent};
use dropdigest_scan::{Entry, ScanProgress, TreeFlattener};

use crate::runner::BatchRunner;

/// Accepts drops and reports them on one event channel.
///
/// Only one drop is processed at a time. Depending on the
/// [`OverlapPolicy`], a drop arriving while another is in flight either
/// waits its turn or fails with [`DropError::Busy`]. Either way the events
/// of two drops never interleave.
pub struct DropSession {
    config: DropConfig,
    gate: Mutex<()>,
    next_id: AtomicU64,
    flattener: TreeFlattener,
    runner: BatchRunner,
    tx: mpsc::Sender<ReportEvent>,
}

impl DropSession {
    /// Create a session and the receiver for its report events.
    pub fn new(config: DropConfig) -> (Self, mpsc::Receiver<ReportEvent>) {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));
        let session = Self {
            runner: BatchRunner::new(config.clone()),
            config,
            gate: Mutex::new(()),
            next_id: AtomicU64::new(0),
            flattener: TreeFlattener::new(),
            tx,
        };
        (session, rx)
    }

    /// Subscribe to traversal progress of subsequent drops.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ScanProgress> {
        self.flattener.subscribe()
    }

    /// The session configuration.
    pub fn config(&self) -> &DropConfig {
        &self.config
    }

    /// Process one drop: flatten the payload, then digest every file.
    ///
    /// Events are sent on a bounded channel, so the receiver must be drained
    /// while this runs; a drop with more events than `channel_size` waits
    /// for the consumer otherwise.
    pub async fn process(&self, payload: Vec<Entry>) -> Result<DropSummary, DropError> {
        let _guard = match self.config.overlap_policy {
            OverlapPolicy::Serialize => self.gate.lock().await,
            OverlapPolicy::Reject => self.gate.try_lock().map_err(|_| {
                tracing::warn!("drop rejected, another drop is in flight");
                DropError::Busy
            })?,
        };

        let drop_id = DropId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::info!(drop = %drop_id, entries = payload.len(), "drop received");

        let flat = self.flattener.flatten(payload).await;
        let summary = self.runner.run(drop_id, flat, &self.tx).await?;

        tracing::info!(
            drop = %drop_id,
            reported = summary.files_reported,
            failed = summary.files_failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "drop finished"
        );
        Ok(summary)
    }
}

/// Process a single drop in the background.
///
/// Returns the receiver for its report events; the channel closes once the
/// drop has finished.
pub fn start_drop(payload: Vec<Entry>, config: DropConfig) -> mpsc::Receiver<ReportEvent> {
    let (session, rx) = DropSession::new(config);
    tokio::spawn(async move {
        if let Err(err) = session.process(payload).await {
            tracing::error!(error = %err, "drop aborted");
        }
    });
    rx
}
