use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::downloader::errors::DownloadError;
use crate::downloader::tools::{ToolManager, ToolType};
use crate::downloader::traits::Muxer;

/// Muxer running `ffmpeg`: video stream copied, audio re-encoded to AAC
pub struct FfmpegMuxer {
    ffmpeg_bin: String,
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self::with_path(ToolManager::new().binary_path(&ToolType::Ffmpeg))
    }

    pub fn with_path(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    pub fn build_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-strict".to_string(),
            "experimental".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        let args = Self::build_args(video, audio, output);
        debug!("[ffmpeg] {} {}", self.ffmpeg_bin, args.join(" "));

        // stdin closed: an existing output makes ffmpeg refuse instead of prompting
        let result = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DownloadError::from_spawn(&self.ffmpeg_bin, &e))?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        warn!("[ffmpeg] exited with {}", result.status);
        Err(DownloadError::Mux(stderr))
    }
}
