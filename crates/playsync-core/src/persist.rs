//! Best-effort progress persistence.
//!
//! The engine never waits on storage. Records go out through a
//! [`ProgressSink`] (a one-way send); [`BackgroundSaver`] forwards them to a
//! [`ProgressStore`] on a worker thread and logs whatever the store reports.

use crate::throttle::ProgressRecord;
use anyhow::{Context, Result};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Idempotent upsert keyed by media id. Writes may arrive duplicated or out of
/// order, so implementations must be last-write-wins safe.
pub trait ProgressStore: Send + 'static {
    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()>;
}

/// Fire-and-forget destination for progress records.
pub trait ProgressSink {
    fn send(&self, record: ProgressRecord);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn send(&self, record: ProgressRecord) {
        (**self).send(record)
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn send(&self, record: ProgressRecord) {
        (**self).send(record)
    }
}

impl ProgressSink for mpsc::Sender<ProgressRecord> {
    fn send(&self, record: ProgressRecord) {
        if let Err(err) = mpsc::Sender::send(self, record) {
            warn!(media_id = %err.0.media_id, "Progress receiver dropped; save discarded");
        }
    }
}

/// Owns a worker thread that drains records into a store.
///
/// Dropping the saver closes the channel and waits for queued records.
pub struct BackgroundSaver {
    tx: Option<mpsc::Sender<ProgressRecord>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundSaver {
    pub fn spawn<S: ProgressStore>(store: S) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<ProgressRecord>();
        let handle = thread::Builder::new()
            .name("progress-saver".to_string())
            .spawn(move || {
                for record in rx {
                    match store.upsert_progress(&record) {
                        Ok(()) => debug!(
                            media_id = %record.media_id,
                            progress_sec = record.progress_sec,
                            "Saved progress"
                        ),
                        Err(err) => warn!(
                            media_id = %record.media_id,
                            progress_sec = record.progress_sec,
                            "Failed to save progress: {err:#}"
                        ),
                    }
                }
            })
            .context("Spawning progress saver thread")?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }
}

impl ProgressSink for BackgroundSaver {
    fn send(&self, record: ProgressRecord) {
        match &self.tx {
            Some(tx) => ProgressSink::send(tx, record),
            None => warn!(media_id = %record.media_id, "Progress saver closed; save discarded"),
        }
    }
}

impl Drop for BackgroundSaver {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Progress saver thread panicked");
            }
        }
    }
}
