// InfoExtractor trait and extraction options

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::ExtractedMedia;

pub const DEFAULT_FORMAT_SELECTOR: &str = "bestvideo+bestaudio/best";

/// Options forwarded to the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// yt-dlp format selector
    #[serde(default = "default_format")]
    pub format: String,
    /// Only the single item, never the surrounding playlist
    #[serde(default = "default_true")]
    pub noplaylist: bool,
    #[serde(default = "default_true")]
    pub quiet: bool,
}

fn default_format() -> String {
    DEFAULT_FORMAT_SELECTOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            format: default_format(),
            noplaylist: true,
            quiet: true,
        }
    }
}

/// Trait for info extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    fn is_available(&self) -> bool;

    /// List the formats, title and description behind `url`.
    async fn extract(
        &self,
        url: &str,
        options: &ExtractionOptions,
        proxy: Option<&str>,
    ) -> Result<ExtractedMedia, DownloadError>;
}
