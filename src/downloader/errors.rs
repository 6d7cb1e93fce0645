// Error types for the download pipeline

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// URL does not belong to a supported platform
    #[error("invalid URL: {0} (expected a YouTube or TikTok link)")]
    InvalidUrl(String),

    /// Extraction succeeded but returned nothing usable
    #[error("no formats available for the provided URL")]
    NoFormats,

    /// Metadata service failed
    #[error("no formats available: {0}")]
    Extraction(String),

    /// Transfer engine reported a failure (network, HTTP, format not available...)
    #[error("download failed: {0}")]
    Transfer(String),

    /// Anything else that went wrong around a transfer or a mux
    #[error("download failed: unexpected error: {0}")]
    Unexpected(String),

    /// Muxing tool exited with a non-zero status
    #[error("merge failed: {0}")]
    Mux(String),

    /// yt-dlp or ffmpeg could not be started
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("parse error: {0}")]
    ParseError(String),

    /// Rejected configuration key or value
    #[error("config error: {0}")]
    Config(String),
}

impl DownloadError {
    /// Classify a failed yt-dlp run from its stderr.
    pub fn from_engine_stderr(stderr: &str) -> Self {
        let summary = summarize_stderr(stderr);

        if stderr.contains("command not found")
            || stderr.contains("No such file or directory (os error 2)")
        {
            return Self::ToolNotFound(summary);
        }

        if stderr.contains("ERROR:")
            || stderr.contains("HTTP Error")
            || stderr.contains("timed out")
            || stderr.contains("Requested format is not available")
        {
            return Self::Transfer(summary);
        }

        Self::Unexpected(summary)
    }

    /// Map a spawn/IO failure of an external process.
    pub fn from_spawn(program: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound(program.to_string())
        } else {
            Self::Unexpected(format!("failed to start {}: {}", program, err))
        }
    }

    /// Whether this failure was reported by the transfer engine itself.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, Self::Transfer(_))
    }
}

/// Reduce a multi-line stderr dump to the lines a user should see.
pub fn summarize_stderr(stderr: &str) -> String {
    let important: Vec<&str> = stderr
        .lines()
        .map(|l| l.trim())
        .filter(|s| {
            s.starts_with("ERROR:")
                || s.contains("HTTP Error")
                || s.contains("Forbidden")
                || s.contains("Requested format is not available")
        })
        .take(2)
        .collect();

    if !important.is_empty() {
        return important.join(" | ");
    }

    stderr
        .lines()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}
