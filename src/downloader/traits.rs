// Seams between the orchestration core and the external tools

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::errors::DownloadError;
use super::models::{DownloadProgress, EngineConfig};

/// Transfer status as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Downloading,
    Finished,
    Error,
    Other(String),
}

impl TransferStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One raw progress event from the transfer engine
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: TransferStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<u64>,
}

impl ProgressEvent {
    pub fn downloading(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            status: TransferStatus::Downloading,
            downloaded_bytes,
            total_bytes,
            speed_bytes_per_sec: None,
            eta_seconds: None,
        }
    }
}

/// Receives engine events synchronously, on the task driving the transfer
pub trait ProgressSink {
    fn on_event(&mut self, event: &ProgressEvent);
}

/// Presentation side of progress: gets normalized updates
pub trait ProgressReporter: Send {
    fn report(&mut self, progress: &DownloadProgress);
}

impl<F> ProgressReporter for F
where
    F: FnMut(&DownloadProgress) + Send,
{
    fn report(&mut self, progress: &DownloadProgress) {
        self(progress)
    }
}

/// Reporter that writes status lines to the log
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&mut self, progress: &DownloadProgress) {
        info!(percent = progress.percent, "{}", progress.status);
    }
}

/// Everything the engine needs for one transfer
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub url: &'a str,
    pub format_id: &'a str,
    pub output_path: &'a Path,
    pub config: &'a EngineConfig,
}

/// External component doing the byte transfer for a chosen format
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Run one blocking transfer, honoring the configured retry budget.
    async fn transfer(
        &self,
        request: TransferRequest<'_>,
        sink: &mut (dyn ProgressSink + Send),
    ) -> Result<(), DownloadError>;
}

/// External process combining one video and one audio file
#[async_trait]
pub trait Muxer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError>;
}
