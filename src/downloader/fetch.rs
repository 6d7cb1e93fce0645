// The "fetch formats" action: validate, extract, classify

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::errors::DownloadError;
use super::extractors::{ExtractionOptions, InfoExtractor};
use super::format_selector::FormatSelector;
use super::models::{FormatRecord, SourcePlatform};

/// Everything the user picks from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedMedia {
    pub url: String,
    pub platform: SourcePlatform,
    pub title: String,
    pub description: String,
    pub video_formats: Vec<FormatRecord>,
    pub audio_formats: Vec<FormatRecord>,
}

impl FetchedMedia {
    /// Look a selection up by format id among the offered candidates.
    pub fn find(&self, format_id: &str) -> Option<&FormatRecord> {
        self.video_formats
            .iter()
            .chain(self.audio_formats.iter())
            .find(|f| f.format_id == format_id)
    }
}

pub async fn fetch_formats(
    extractor: &dyn InfoExtractor,
    url: &str,
    options: &ExtractionOptions,
    proxy: Option<&str>,
) -> Result<FetchedMedia, DownloadError> {
    let platform =
        SourcePlatform::from_url(url).ok_or_else(|| DownloadError::InvalidUrl(url.to_string()))?;
    info!("[Fetch] {} via {}: {}", platform, extractor.name(), url);

    let media = extractor.extract(url, options, proxy).await?;
    if media.formats.is_empty() {
        warn!("[Fetch] extraction returned no formats for {}", url);
        return Err(DownloadError::NoFormats);
    }

    let (video_formats, audio_formats) = FormatSelector::split(&media.formats, platform);
    info!(
        "[Fetch] {} formats → {} video / {} audio candidates",
        media.formats.len(),
        video_formats.len(),
        audio_formats.len()
    );

    Ok(FetchedMedia {
        url: url.to_string(),
        platform,
        title: media.title,
        description: media.description,
        video_formats,
        audio_formats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::ExtractedMedia;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeExtractor {
        result: Result<ExtractedMedia, DownloadError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InfoExtractor for FakeExtractor {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn extract(
            &self,
            _url: &str,
            _options: &ExtractionOptions,
            _proxy: Option<&str>,
        ) -> Result<ExtractedMedia, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn record(id: &str, ext: &str, video: bool, height: Option<u32>, size: u64) -> FormatRecord {
        FormatRecord {
            format_id: id.to_string(),
            extension: ext.to_string(),
            has_video_codec: video,
            has_audio_codec: !video,
            height_px: height,
            file_size_bytes: Some(size),
            chunk_size_hint: None,
        }
    }

    fn youtube_media() -> ExtractedMedia {
        ExtractedMedia {
            title: "Clip".to_string(),
            description: "desc".to_string(),
            formats: vec![
                record("139", "m4a", false, None, 500),
                record("135", "mp4", true, Some(480), 1_000),
                record("160", "mp4", true, Some(144), 100),
                record("136", "mp4", true, Some(720), 2_000),
                record("251", "webm", false, None, 600),
                record("137", "mp4", true, Some(1080), 4_000),
                record("140", "m4a", false, None, 900),
            ],
        }
    }

    #[tokio::test]
    async fn test_youtube_fetch_classifies_in_order() {
        let extractor = FakeExtractor {
            result: Ok(youtube_media()),
            calls: AtomicUsize::new(0),
        };

        let fetched = fetch_formats(
            &extractor,
            "https://www.youtube.com/watch?v=abc",
            &ExtractionOptions::default(),
            None,
        )
        .await
        .unwrap();

        let ids = |list: &[FormatRecord]| {
            list.iter()
                .map(|f| f.format_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(fetched.platform, SourcePlatform::YouTube);
        assert_eq!(ids(&fetched.video_formats), vec!["135", "136", "137"]);
        assert_eq!(ids(&fetched.audio_formats), vec!["139", "140"]);
        assert_eq!(fetched.find("136").map(|f| f.height_px), Some(Some(720)));
        assert!(fetched.find("251").is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_stops_before_extraction() {
        let extractor = FakeExtractor {
            result: Ok(youtube_media()),
            calls: AtomicUsize::new(0),
        };

        let options = ExtractionOptions::default();
        let err = fetch_formats(&extractor, "https://example.com/v", &options, None)
            .await
            .unwrap_err();

        assert_eq!(err, DownloadError::InvalidUrl("https://example.com/v".to_string()));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_and_failed_extraction() {
        let empty = FakeExtractor {
            result: Ok(ExtractedMedia {
                title: "t".to_string(),
                description: String::new(),
                formats: Vec::new(),
            }),
            calls: AtomicUsize::new(0),
        };
        let options = ExtractionOptions::default();
        let err = fetch_formats(&empty, "https://www.tiktok.com/@a/video/1", &options, None)
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::NoFormats);

        let failing = FakeExtractor {
            result: Err(DownloadError::Extraction("ERROR: Unsupported URL".to_string())),
            calls: AtomicUsize::new(0),
        };
        let err = fetch_formats(&failing, "https://youtu.be/abc", &options, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no formats available: ERROR: Unsupported URL");
    }
}
