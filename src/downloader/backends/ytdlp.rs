use std::process::Stdio;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::downloader::errors::DownloadError;
use crate::downloader::tools::{ToolManager, ToolType};
use crate::downloader::traits::{
    ProgressEvent, ProgressSink, TransferEngine, TransferRequest, TransferStatus,
};
use crate::downloader::utils::{escape_output_template, get_proxy_args, get_retry_args};

/// One machine-readable line per progress tick:
/// `[progress] downloading|1024|4096|512.5|6`
const PROGRESS_TEMPLATE: &str = concat!(
    "download:[progress] %(progress.status)s",
    "|%(progress.downloaded_bytes)s",
    "|%(progress.total_bytes,progress.total_bytes_estimate)s",
    "|%(progress.speed)s",
    "|%(progress.eta)s",
);

lazy_static! {
    static ref PROGRESS_RE: Regex =
        Regex::new(r"^\[progress\]\s*(\w+)\|([^|]*)\|([^|]*)\|([^|]*)\|([^|]*)$").unwrap();
}

/// Parse one templated progress line. yt-dlp prints `NA` for missing fields.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line.trim())?;
    let number = |i: usize| -> Option<f64> {
        caps.get(i)
            .and_then(|m| m.as_str().trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    };

    Some(ProgressEvent {
        status: TransferStatus::parse(caps.get(1)?.as_str()),
        downloaded_bytes: number(2).map_or(0, |v| v as u64),
        total_bytes: number(3).map(|v| v as u64),
        speed_bytes_per_sec: number(4),
        eta_seconds: number(5).map(|v| v as u64),
    })
}

/// Transfer engine driving the `yt-dlp` binary
pub struct YtDlpEngine {
    ytdlp_bin: String,
}

impl YtDlpEngine {
    pub fn new() -> Self {
        Self::with_path(ToolManager::new().binary_path(&ToolType::YtDlp))
    }

    pub fn with_path(ytdlp_bin: impl Into<String>) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
        }
    }

    pub fn build_args(request: &TransferRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            request.format_id.to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-update".to_string(),
        ];
        args.extend(get_retry_args(request.config));
        args.extend([
            "-o".to_string(),
            escape_output_template(&request.output_path.to_string_lossy()),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
        ]);
        args.extend(get_proxy_args(request.config.proxy.as_deref()));
        args.push(request.url.to_string());
        args
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn transfer(
        &self,
        request: TransferRequest<'_>,
        sink: &mut (dyn ProgressSink + Send),
    ) -> Result<(), DownloadError> {
        let args = Self::build_args(&request);
        debug!("[yt-dlp] {} {}", self.ytdlp_bin, args.join(" "));

        let mut child = Command::new(&self.ytdlp_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::from_spawn(&self.ytdlp_bin, &e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Unexpected("Failed to capture stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Unexpected("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                warn!("[yt-dlp] Failed to read stderr: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        // Progress is delivered on this task, line by line, while yt-dlp runs.
        // Lines are raw bytes: file names may not be UTF-8.
        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(raw) = lines
            .next_segment()
            .await
            .map_err(|e| DownloadError::Unexpected(format!("Failed to read yt-dlp output: {}", e)))?
        {
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\r');
            match parse_progress_line(line) {
                Some(event) => sink.on_event(&event),
                None if line.contains("[download]") || line.contains("[Merger]") => {
                    info!("[yt-dlp] {}", line)
                }
                None => debug!("[yt-dlp] {}", line),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::Unexpected(format!("Process error: {}", e)))?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        warn!("[yt-dlp] exited with {}: {}", status, stderr_output.trim());
        Err(DownloadError::from_engine_stderr(&stderr_output))
    }
}
