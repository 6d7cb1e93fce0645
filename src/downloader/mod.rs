// Downloader module - format selection, naming, progress, download and merge

pub mod backends;
pub mod errors;
pub mod extractors;
pub mod fetch;
pub mod format_selector;
pub mod merger;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use fetch::{fetch_formats, FetchedMedia};
pub use format_selector::{FormatOption, FormatSelector};
pub use merger::MergeCoordinator;
pub use models::{
    DownloadProgress, DownloadResult, DownloadTask, EngineConfig, ExtractedMedia, FormatRecord,
    MergeResult, MergeTask, ProgressState, SourcePlatform,
};
pub use naming::OutputNamer;
pub use orchestrator::DownloadOrchestrator;
pub use progress::{format_size, ProgressTracker};
pub use traits::{
    LogReporter, Muxer, ProgressEvent, ProgressReporter, ProgressSink, TransferEngine,
    TransferRequest, TransferStatus,
};
