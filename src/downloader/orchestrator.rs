// DownloadOrchestrator - drives one download task end-to-end
//
// Retries live entirely in the engine (EngineConfig); the orchestrator makes
// a single blocking attempt and turns every failure into a DownloadResult.

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::errors::DownloadError;
use super::models::{DownloadResult, DownloadTask, EngineConfig, FormatRecord};
use super::naming::OutputNamer;
use super::progress::ProgressTracker;
use super::traits::{ProgressReporter, TransferEngine, TransferRequest};

pub struct DownloadOrchestrator {
    engine: Box<dyn TransferEngine>,
    config: EngineConfig,
    // Held from name computation until the file is written, so a second
    // caller never computes the same serial.
    naming_lock: Mutex<()>,
}

impl DownloadOrchestrator {
    pub fn new(engine: Box<dyn TransferEngine>, config: EngineConfig) -> Self {
        Self {
            engine,
            config,
            naming_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn download(
        &self,
        task: &DownloadTask,
        reporter: &mut (dyn ProgressReporter + '_),
    ) -> DownloadResult {
        match self.try_download(task, reporter).await {
            Ok(path) => {
                info!("[Downloader] ✓ {} saved to {}", task.format_id, path.display());
                DownloadResult::completed(path)
            }
            Err(e) => {
                let e = match e {
                    DownloadError::Transfer(_) | DownloadError::Unexpected(_) => e,
                    other => DownloadError::Unexpected(other.to_string()),
                };
                error!("[Downloader] ✗ {} failed: {}", task.format_id, e);
                DownloadResult::failed(e.to_string())
            }
        }
    }

    async fn try_download(
        &self,
        task: &DownloadTask,
        reporter: &mut (dyn ProgressReporter + '_),
    ) -> Result<PathBuf, DownloadError> {
        let _guard = self.naming_lock.lock().await;

        tokio::fs::create_dir_all(&task.destination_dir)
            .await
            .map_err(|e| {
                DownloadError::Unexpected(format!(
                    "cannot create {}: {}",
                    task.destination_dir.display(),
                    e
                ))
            })?;

        let filename =
            OutputNamer::next_name_in(&task.title, &task.extension, &task.destination_dir)
                .map_err(|e| {
                    DownloadError::Unexpected(format!(
                        "cannot list {}: {}",
                        task.destination_dir.display(),
                        e
                    ))
                })?;
        let output_path = task.destination_dir.join(&filename);

        let mut tracker = ProgressTracker::new(reporter);
        tracker.reset();
        tracker.notify(format!("Starting download: {}", filename));

        info!(
            "[Downloader] {} → {} via {}",
            task.format_id,
            output_path.display(),
            self.engine.name()
        );

        let request = TransferRequest {
            url: &task.url,
            format_id: &task.format_id,
            output_path: &output_path,
            config: &self.config,
        };
        self.engine.transfer(request, &mut tracker).await?;

        tracker.notify(format!("Download completed: {}", filename));
        Ok(output_path)
    }

    /// Download every selected record in order, one result per selection.
    pub async fn download_selected(
        &self,
        url: &str,
        title: &str,
        destination_dir: &std::path::Path,
        selections: &[FormatRecord],
        reporter: &mut (dyn ProgressReporter + '_),
    ) -> Vec<DownloadResult> {
        let mut results = Vec::with_capacity(selections.len());
        for record in selections {
            let task = DownloadTask::for_record(url, title, record, destination_dir);
            let result = self.download(&task, reporter).await;
            if !result.success {
                warn!("[Downloader] Continuing after failed selection {}", record.format_id);
            }
            results.push(result);
        }
        results
    }
}
