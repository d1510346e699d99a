//! Turns change events into transfer tasks.
//!
//! The dispatcher runs on the agent's consumer loop and never awaits a
//! transfer. Each accepted event becomes one task in a [`JoinSet`]; a
//! [`Semaphore`] caps how many of those tasks may be alive at once. When the
//! cap is reached the event is dropped and counted, never queued.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use fc_transfer::{FileCopier, TransferPipeline, TransferStats};
use fc_watcher::{ChangeEvent, FileFilter};

/// What [`EventDispatcher::dispatch`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a creation, or the file name did not match.
    Ignored,
    /// A transfer task was started.
    Spawned,
    /// The event matched but no task could be started.
    Dropped,
}

/// Fans matching creation events out to transfer tasks.
#[derive(Debug)]
pub struct EventDispatcher<F, C> {
    filter: F,
    pipeline: TransferPipeline<C>,
    tasks: JoinSet<()>,
    slots: Arc<Semaphore>,
}

impl<F: FileFilter, C: FileCopier> EventDispatcher<F, C> {
    /// Creates a dispatcher allowing at most `max_pending` live transfers.
    #[must_use]
    pub fn new(filter: F, pipeline: TransferPipeline<C>, max_pending: usize) -> Self {
        Self {
            filter,
            pipeline,
            tasks: JoinSet::new(),
            slots: Arc::new(Semaphore::new(max_pending.max(1))),
        }
    }

    /// Returns the counters shared with the transfer tasks.
    #[must_use]
    pub fn stats(&self) -> &Arc<TransferStats> {
        self.pipeline.stats()
    }

    /// Returns the number of tasks not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Handles one event without waiting on any transfer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, event: ChangeEvent) -> Dispatch {
        self.reap();

        if !event.is_created() || !self.filter.should_process(&event.path) {
            tracing::trace!(path = %event.path, kind = event.kind.label(), "Event ignored");
            return Dispatch::Ignored;
        }

        let Ok(slot) = Arc::clone(&self.slots).try_acquire_owned() else {
            self.pipeline.stats().record_dropped();
            tracing::error!(
                path = %event.path,
                in_flight = self.tasks.len(),
                "Too many pending transfers, dropping event"
            );
            return Dispatch::Dropped;
        };

        let job = match self.pipeline.job_for(&event.path) {
            Ok(job) => job,
            Err(error) => {
                self.pipeline.stats().record_dropped();
                tracing::error!(path = %event.path, error = %error, "Cannot transfer file, dropping event");
                return Dispatch::Dropped;
            }
        };

        self.pipeline.stats().record_detected();
        tracing::info!(
            path = %event.path,
            destination = %job.destination(),
            "File detected"
        );

        let pipeline = self.pipeline.clone();
        self.tasks.spawn(async move {
            let _slot = slot;
            pipeline.run(job).await;
        });
        Dispatch::Spawned
    }

    /// Waits for every in-flight transfer to settle.
    pub async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            tracing::info!(in_flight = self.tasks.len(), "Waiting for in-flight transfers");
        }
        while let Some(result) = self.tasks.join_next().await {
            log_join(result);
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join(result);
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(error) = result {
        tracing::error!(error = %error, "Transfer task ended abnormally");
    }
}
