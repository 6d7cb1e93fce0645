pub mod config;
pub mod downloader;

pub use config::{AppConfig, ConfigKey, ConfigStore, LangConvert};
pub use downloader::{
    fetch_formats, DownloadError, DownloadOrchestrator, DownloadResult, FetchedMedia,
    FormatRecord, FormatSelector, MergeCoordinator, MergeResult, MergeTask, OutputNamer,
    SourcePlatform,
};
