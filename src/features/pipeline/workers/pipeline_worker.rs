use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{timeout, MissedTickBehavior};
use uuid::Uuid;

use crate::core::config::PipelineConfig;
use crate::core::error::Result;
use crate::features::pipeline::events::{ObjectCreatedEvent, PipelineHandle};
use crate::features::pipeline::services::{Notifier, RouterService, StagingLoader, ValidationService};
use crate::features::uploads::models::{FileRecord, FileStatus};
use crate::features::uploads::services::FileRecordService;

/// Drives each file record through validation, routing, loading and
/// notification. One worker task owns the event channel; individual files
/// are processed on spawned tasks, so a slow file never blocks the queue.
///
/// Every stage is idempotent and every status write is conditional, which
/// makes redelivered and swept events safe to process concurrently.
#[derive(Clone)]
pub struct PipelineWorker {
    records: Arc<FileRecordService>,
    validator: Arc<ValidationService>,
    router: Arc<RouterService>,
    loader: Arc<StagingLoader>,
    notifier: Arc<Notifier>,
    config: PipelineConfig,
    handle: PipelineHandle,
}

impl PipelineWorker {
    pub fn new(
        records: Arc<FileRecordService>,
        validator: Arc<ValidationService>,
        router: Arc<RouterService>,
        loader: Arc<StagingLoader>,
        notifier: Arc<Notifier>,
        config: PipelineConfig,
        handle: PipelineHandle,
    ) -> Self {
        Self {
            records,
            validator,
            router,
            loader,
            notifier,
            config,
            handle,
        }
    }

    /// Event loop; runs until the sending side of the channel is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<ObjectCreatedEvent>) {
        tracing::info!(
            "Pipeline worker started (sweep every {}s, stuck after {}s)",
            self.config.sweep_interval_secs,
            self.config.stuck_after_secs
        );

        let mut sweep = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => {
                        let worker = self.clone();
                        tokio::spawn(async move {
                            worker.process_file(event.file_id).await;
                        });
                    }
                    None => {
                        tracing::info!("Event channel closed, pipeline worker stopping");
                        break;
                    }
                },
                _ = sweep.tick() => self.sweep().await,
            }
        }
    }

    pub async fn process_file(&self, file_id: Uuid) {
        if let Err(e) = self.advance(file_id).await {
            if e.is_retryable() {
                tracing::warn!(
                    "Transient pipeline error for file {}, deferring to sweep: {}",
                    file_id,
                    e
                );
            } else {
                tracing::error!("Pipeline error for file {}: {}", file_id, e);
            }
        }
    }

    /// Advance one record as far as it can go in a single pass.
    async fn advance(&self, file_id: Uuid) -> Result<()> {
        let Some(record) = self.records.get(file_id).await? else {
            tracing::warn!("Pipeline event for unknown file {}", file_id);
            return Ok(());
        };

        if record.status == FileStatus::Uploaded {
            self.validate(&record).await?;
        }

        let Some(record) = self.records.get(file_id).await? else {
            return Ok(());
        };

        match record.status {
            FileStatus::Validated => {
                let dest = self.router.route(&record).await?;
                let record = FileRecord {
                    storage_key: dest,
                    ..record
                };
                self.load(&record).await?;

                if let Some(record) = self.records.get(file_id).await? {
                    self.notifier.notify(&record).await;
                }
            }
            FileStatus::Rejected => {
                self.router.route(&record).await?;
                self.notifier.notify(&record).await;
            }
            // Validating means another worker holds the claim; terminal
            // loaded/failed means everything already happened.
            _ => {}
        }

        Ok(())
    }

    async fn validate(&self, record: &FileRecord) -> Result<()> {
        let budget = Duration::from_secs(self.config.validation_timeout_secs);

        match timeout(budget, self.validator.run(record)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                // The inspection future is gone; close the claim as rejected.
                self.records
                    .finish_validation(
                        record.id,
                        FileStatus::Rejected,
                        &[format!(
                            "Validation timed out after {}s",
                            self.config.validation_timeout_secs
                        )],
                        &[],
                        &json!({}),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn load(&self, record: &FileRecord) -> Result<()> {
        let budget = Duration::from_secs(self.config.load_timeout_secs);

        match timeout(budget, self.loader.load(record)).await {
            Ok(Ok(_)) => Ok(()),
            // Transient errors leave the record validated; the sweep retries.
            Ok(Err(e)) if e.is_retryable() => Err(e),
            Ok(Err(e)) => {
                self.records.mark_failed(record.id, &e.to_string()).await?;
                Ok(())
            }
            Err(_) => {
                self.records
                    .mark_failed(
                        record.id,
                        &format!(
                            "Staging load timed out after {}s",
                            self.config.load_timeout_secs
                        ),
                    )
                    .await?;
                Ok(())
            }
        }
    }

    /// Recover records the event channel lost: requeue stuck `uploaded`
    /// and `validated` records, reject stuck `validating` ones.
    async fn sweep(&self) {
        let age = chrono::Duration::seconds(self.config.stuck_after_secs);

        let stuck = match self.records.find_stuck(age, 100).await {
            Ok(stuck) => stuck,
            Err(e) => {
                tracing::error!("Stuck-record sweep failed: {}", e);
                return;
            }
        };

        for record in stuck {
            match record.status {
                FileStatus::Validating => {
                    tracing::warn!("File {} stuck in validating, rejecting", record.id);
                    match self.validator.reject_timed_out(record.id).await {
                        // Route and notify the freshly rejected record
                        Ok(true) => self.handle.publish(record.id),
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!("Could not reject stuck file {}: {}", record.id, e)
                        }
                    }
                }
                _ => {
                    tracing::info!("Requeueing stuck file {} ({})", record.id, record.status);
                    self.handle.publish(record.id);
                }
            }
        }
    }
}
