// Concrete collaborators: yt-dlp transfers, ffmpeg muxing

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::FfmpegMuxer;
pub use ytdlp::YtDlpEngine;
