//! Fans a multi-image request out across bounded concurrent tasks and joins
//! the per-item outcomes back in upload order.

use futures::future::join_all;
use log::{error, info, warn};
use shared::{BatchItemResult, BatchResponse, ItemStatus};
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::upload::UploadedFile;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Too many files. Maximum {max} files allowed")]
    TooManyFiles { max: usize },
}

/// Caps how many items of one batch run at once. Every `run` gets its own
/// permits, so concurrent batches never wait on each other.
#[derive(Clone)]
pub struct BatchCoordinator {
    concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `process` on every valid file. Files failing validation are
    /// recorded as rejected and never take a task slot; a failing item never
    /// affects its siblings. The whole batch is refused up front when it holds
    /// more than `max_files` files.
    pub async fn run<T, E, F, Fut>(
        &self,
        files: Vec<UploadedFile>,
        max_files: usize,
        max_size: usize,
        process: F,
    ) -> Result<BatchResponse<T>, BatchError>
    where
        E: Display,
        F: Fn(UploadedFile) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if files.len() > max_files {
            warn!(
                "Rejecting batch of {} files (maximum {})",
                files.len(),
                max_files
            );
            return Err(BatchError::TooManyFiles { max: max_files });
        }

        let started = Instant::now();
        let batch_id = Uuid::new_v4();
        let total_files = files.len();
        info!("Batch {} processing {} files", batch_id, total_files);

        let process = &process;
        let semaphore = &Semaphore::new(self.concurrency);
        let tasks = files.into_iter().enumerate().map(|(index, file)| async move {
            let filename = file.filename.clone();
            if let Err(e) = file.validate(max_size) {
                warn!("Batch item {} rejected: {}", index, e);
                return BatchItemResult::rejected(index, filename, e.to_string());
            }

            let Ok(_permit) = semaphore.acquire().await else {
                return BatchItemResult::failed(index, filename, "Batch worker pool closed".to_string());
            };
            match process(file).await {
                Ok(payload) => BatchItemResult::succeeded(index, filename, payload),
                Err(e) => {
                    error!("Error processing image {}: {}", index, e);
                    BatchItemResult::failed(index, filename, e.to_string())
                }
            }
        });
        let results: Vec<BatchItemResult<T>> = join_all(tasks).await;

        let processed = results.iter().filter(|item| item.success).count();
        let failed = results
            .iter()
            .filter(|item| item.status != ItemStatus::Succeeded)
            .count();
        info!(
            "Batch {} finished: {} processed, {} failed",
            batch_id, processed, failed
        );

        Ok(BatchResponse {
            batch_id,
            total_files,
            processed,
            failed,
            results,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }
}
