use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::config::JobsConfig;
use crate::error::{AppError, AppResult};
use crate::services::ProcessingService;

/// Wrapper around tokio-cron-scheduler running the periodic processing pass.
///
/// The schedule is fixed at startup from `[jobs].process_cron`. Each tick
/// claims and delivers one batch of due events; errors are logged and the
/// next tick starts fresh.
pub struct ProcessingScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    processing: ProcessingService,
    config: JobsConfig,
}

impl ProcessingScheduler {
    pub async fn new(processing: ProcessingService, config: JobsConfig) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            processing,
            config,
        })
    }

    /// Register the processing job and start the scheduler
    pub async fn start(&self) -> AppResult<()> {
        self.schedule_processing_pass().await?;
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    async fn schedule_processing_pass(&self) -> AppResult<()> {
        let processing = self.processing.clone();

        let cron_job = Job::new_async(self.config.process_cron.as_str(), move |_uuid, _lock| {
            let processing = processing.clone();

            Box::pin(async move {
                match processing.process_due().await {
                    Ok(outcome) => {
                        if outcome.processed > 0 {
                            tracing::info!(
                                processed = outcome.processed,
                                sent = outcome.sent,
                                failed = outcome.failed,
                                "Scheduled processing pass complete"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled processing pass failed");
                    }
                }
            })
        })
        .map_err(|e| AppError::BadRequest {
            message: format!("Invalid cron expression: {}", e),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(())
    }
}
