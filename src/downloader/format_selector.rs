// FormatSelector - per-platform format classification
//
// Splits the raw formats returned by extraction into the video and audio
// candidates offered to the user:
// - YouTube video: 480p/720p/1080p mp4 with a known size (or chunk size)
// - YouTube audio: m4a with a known size
// - TikTok video: mp4 with a known size; TikTok has no standalone audio

use serde::{Deserialize, Serialize};

use super::models::{FormatRecord, SourcePlatform};
use super::progress::format_size;

const YOUTUBE_HEIGHTS: [u32; 3] = [480, 720, 1080];

/// Selectable option for UI display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOption {
    /// Display label (e.g., "137 - MP4, 1080p, 120.50 MB")
    pub label: String,
    pub format_id: String,
    pub extension: String,
    pub is_audio: bool,
}

pub struct FormatSelector;

impl FormatSelector {
    /// Keep the records matching the platform's video or audio rule.
    /// Input order is preserved and duplicates pass through.
    pub fn classify(
        records: &[FormatRecord],
        platform: SourcePlatform,
        want_video: bool,
    ) -> Vec<FormatRecord> {
        let keep: fn(&FormatRecord) -> bool = match (platform, want_video) {
            (SourcePlatform::YouTube, true) => Self::is_youtube_video,
            (SourcePlatform::YouTube, false) => Self::is_youtube_audio,
            (SourcePlatform::TikTok, true) => Self::is_tiktok_video,
            (SourcePlatform::TikTok, false) => |_| false,
        };

        records.iter().filter(|r| keep(r)).cloned().collect()
    }

    /// Classify for an optional platform; unknown platforms offer nothing.
    pub fn classify_for(
        records: &[FormatRecord],
        platform: Option<SourcePlatform>,
        want_video: bool,
    ) -> Vec<FormatRecord> {
        platform
            .map(|p| Self::classify(records, p, want_video))
            .unwrap_or_default()
    }

    /// (video candidates, audio candidates)
    pub fn split(
        records: &[FormatRecord],
        platform: SourcePlatform,
    ) -> (Vec<FormatRecord>, Vec<FormatRecord>) {
        (
            Self::classify(records, platform, true),
            Self::classify(records, platform, false),
        )
    }

    fn is_youtube_video(f: &FormatRecord) -> bool {
        f.height_px.map_or(false, |h| YOUTUBE_HEIGHTS.contains(&h))
            && f.has_video_codec
            && f.extension == "mp4"
            && (f.file_size() > 0 || f.chunk_size() > 0)
    }

    fn is_youtube_audio(f: &FormatRecord) -> bool {
        f.has_audio_codec && f.extension == "m4a" && f.file_size() > 0
    }

    fn is_tiktok_video(f: &FormatRecord) -> bool {
        f.has_video_codec && f.extension == "mp4" && f.file_size() > 0
    }

    /// Label shown next to a checkbox. Only the exact file size is shown;
    /// the chunk size is a classification signal, not a size.
    pub fn label(format: &FormatRecord) -> String {
        let size = format_size(format.file_size_bytes.map(|s| s as f64));
        let ext = format.extension.to_uppercase();

        if format.has_video_codec && format.extension == "mp4" {
            let height = format
                .height_px
                .map_or_else(|| "N/A".to_string(), |h| h.to_string());
            format!("{} - {}, {}p, {}", format.format_id, ext, height, size)
        } else {
            format!("{} - {}, {}", format.format_id, ext, size)
        }
    }

    pub fn build_options(formats: &[FormatRecord], is_audio: bool) -> Vec<FormatOption> {
        formats
            .iter()
            .map(|f| FormatOption {
                label: Self::label(f),
                format_id: f.format_id.clone(),
                extension: f.extension.clone(),
                is_audio,
            })
            .collect()
    }
}
