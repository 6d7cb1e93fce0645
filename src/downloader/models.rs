// Common data models for downloader

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref YOUTUBE_RE: Regex =
        Regex::new(r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/.+").unwrap();
    static ref TIKTOK_RE: Regex = Regex::new(r"^https?://(?:www\.)?tiktok\.com/.*").unwrap();
}

/// Platforms with a known classification rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourcePlatform {
    YouTube,
    TikTok,
}

impl SourcePlatform {
    /// Detect the platform from the URL shape. `None` stops the pipeline
    /// before any extraction call.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        if YOUTUBE_RE.is_match(url) {
            Some(Self::YouTube)
        } else if TIKTOK_RE.is_match(url) {
            Some(Self::TikTok)
        } else {
            None
        }
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YouTube => write!(f, "YouTube"),
            Self::TikTok => write!(f, "TikTok"),
        }
    }
}

/// One discoverable stream variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRecord {
    /// Identifier handed back to the transfer engine (e.g. "137", "140")
    pub format_id: String,
    /// Lowercase container extension (mp4, m4a, webm)
    pub extension: String,
    pub has_video_codec: bool,
    pub has_audio_codec: bool,
    /// Vertical resolution in pixels
    pub height_px: Option<u32>,
    /// Exact size in bytes; may be absent or zero
    pub file_size_bytes: Option<u64>,
    /// HTTP chunk size, used as a size signal when `file_size_bytes` is unknown
    pub chunk_size_hint: Option<u64>,
}

impl FormatRecord {
    /// Map one entry of yt-dlp's `formats` array. Missing keys become
    /// explicit defaults instead of leaking through.
    pub fn from_json(f: &serde_json::Value) -> Self {
        let codec_present = |key: &str| {
            f[key]
                .as_str()
                .map_or(false, |c| !c.is_empty() && c != "none")
        };

        Self {
            format_id: f["format_id"].as_str().unwrap_or("").to_string(),
            extension: f["ext"].as_str().unwrap_or("").to_lowercase(),
            has_video_codec: codec_present("vcodec"),
            has_audio_codec: codec_present("acodec"),
            height_px: f["height"].as_u64().and_then(|h| u32::try_from(h).ok()),
            file_size_bytes: f["filesize"].as_u64(),
            chunk_size_hint: f["downloader_options"]["http_chunk_size"].as_u64(),
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size_bytes.unwrap_or(0)
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size_hint.unwrap_or(0)
    }
}

/// Result of one metadata extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMedia {
    pub title: String,
    pub description: String,
    pub formats: Vec<FormatRecord>,
}

/// One stream to download
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub format_id: String,
    pub extension: String,
    pub destination_dir: PathBuf,
    pub title: String,
}

impl DownloadTask {
    pub fn for_record(
        url: &str,
        title: &str,
        record: &FormatRecord,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.to_string(),
            format_id: record.format_id.clone(),
            extension: record.extension.clone(),
            destination_dir: destination_dir.into(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub file_path: Option<PathBuf>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl DownloadResult {
    pub fn completed(file_path: PathBuf) -> Self {
        Self {
            file_path: Some(file_path),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            file_path: None,
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// A video + audio pair to download and mux
#[derive(Debug, Clone)]
pub struct MergeTask {
    pub url: String,
    pub title: String,
    pub video_format_id: String,
    pub audio_format_id: String,
    pub destination_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    /// Per-stream files; left on disk whatever the outcome
    pub video_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub error_message: Option<String>,
}

impl MergeResult {
    pub(crate) fn failed(
        message: impl Into<String>,
        video_path: Option<PathBuf>,
        audio_path: Option<PathBuf>,
    ) -> Self {
        Self {
            success: false,
            output_path: None,
            video_path,
            audio_path,
            error_message: Some(message.into()),
        }
    }
}

/// Progress of the one in-flight transfer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Always within [0, 1]
    pub fraction_complete: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<u64>,
}

/// What the presentation layer receives on every progress update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Retry/timeout policy handed to the transfer engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// HTTP/SOCKS proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
    /// Whole-transfer retries
    pub retries: u32,
    /// Per-fragment retries for segmented (HLS/DASH) transfers
    pub fragment_retries: u32,
    pub segment_timeout: Duration,
}

impl EngineConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            retries: 3,
            fragment_retries: 3,
            segment_timeout: Duration::from_secs(60),
        }
    }
}
