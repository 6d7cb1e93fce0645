// CLI InfoExtractor - uses native `yt-dlp` binary
//
// Runs `yt-dlp --dump-single-json` and maps the `formats` array into
// FormatRecord at the boundary.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::traits::{ExtractionOptions, InfoExtractor};
use crate::downloader::errors::{summarize_stderr, DownloadError};
use crate::downloader::models::{ExtractedMedia, FormatRecord};
use crate::downloader::tools::{ToolManager, ToolType};
use crate::downloader::utils::{get_proxy_args, run_output_with_timeout};

const EXTRACT_TIMEOUT_SECS: u64 = 60;

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
    timeout_secs: u64,
}

impl CliInfoExtractor {
    pub fn new() -> Self {
        Self::with_path(ToolManager::new().binary_path(&ToolType::YtDlp))
    }

    pub fn with_path(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            timeout_secs: EXTRACT_TIMEOUT_SECS,
        }
    }

    /// Build command arguments
    fn build_args(url: &str, options: &ExtractionOptions, proxy: Option<&str>) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string(), "--no-warnings".to_string()];

        if !options.format.trim().is_empty() {
            args.push("-f".to_string());
            args.push(options.format.clone());
        }
        if options.noplaylist {
            args.push("--no-playlist".to_string());
        }
        if options.quiet {
            args.push("--quiet".to_string());
        }

        args.extend(get_proxy_args(proxy));
        args.push(url.to_string());
        args
    }

    /// Parse JSON output
    pub fn parse_json(stdout: &[u8]) -> Result<ExtractedMedia, DownloadError> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let formats = json["formats"]
            .as_array()
            .map(|list| list.iter().map(FormatRecord::from_json).collect())
            .unwrap_or_default();

        Ok(ExtractedMedia {
            title: json["title"].as_str().unwrap_or("No title available").to_string(),
            description: json["description"]
                .as_str()
                .unwrap_or("No description available")
                .to_string(),
            formats,
        })
    }
}

impl Default for CliInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        ToolManager::new().probe_version(&self.ytdlp_path, &ToolType::YtDlp).is_some()
    }

    async fn extract(
        &self,
        url: &str,
        options: &ExtractionOptions,
        proxy: Option<&str>,
    ) -> Result<ExtractedMedia, DownloadError> {
        let args = Self::build_args(url, options, proxy);
        debug!("[CliExtractor] {} {}", self.ytdlp_path, args.join(" "));

        let output = run_output_with_timeout(&self.ytdlp_path, args, self.timeout_secs)
            .await
            .map_err(|e| match e {
                DownloadError::ToolNotFound(_) => e,
                other => DownloadError::Extraction(other.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("[CliExtractor] extraction failed: {}", stderr.trim());
            return Err(DownloadError::Extraction(summarize_stderr(&stderr)));
        }

        let media = Self::parse_json(&output.stdout)?;
        info!(
            "[CliExtractor] '{}': {} formats",
            media.title,
            media.formats.len()
        );
        Ok(media)
    }
}
