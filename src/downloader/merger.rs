// MergeCoordinator - video download, then audio download, then mux
//
// The two downloads run strictly in order; the audio stream is only
// requested after the video file is on disk. Per-stream files are kept
// after a successful merge.

use std::sync::Arc;

use tracing::{error, info};

use super::errors::DownloadError;
use super::models::{DownloadProgress, DownloadTask, MergeResult, MergeTask};
use super::naming::OutputNamer;
use super::orchestrator::DownloadOrchestrator;
use super::traits::{Muxer, ProgressReporter};

pub struct MergeCoordinator {
    downloader: Arc<DownloadOrchestrator>,
    muxer: Box<dyn Muxer>,
}

impl MergeCoordinator {
    pub fn new(downloader: Arc<DownloadOrchestrator>, muxer: Box<dyn Muxer>) -> Self {
        Self { downloader, muxer }
    }

    pub async fn download_and_merge(
        &self,
        task: &MergeTask,
        reporter: &mut (dyn ProgressReporter + '_),
    ) -> MergeResult {
        let video = self
            .downloader
            .download(&self.stream_task(task, &task.video_format_id, "mp4"), reporter)
            .await;
        let video_path = match (video.success, video.file_path) {
            (true, Some(path)) => path,
            _ => {
                let message = video
                    .error_message
                    .unwrap_or_else(|| "download failed: no output file".to_string());
                error!("[Merger] Video stream failed, skipping audio: {}", message);
                return MergeResult::failed(message, None, None);
            }
        };

        let audio = self
            .downloader
            .download(&self.stream_task(task, &task.audio_format_id, "m4a"), reporter)
            .await;
        let audio_path = match (audio.success, audio.file_path) {
            (true, Some(path)) => path,
            _ => {
                let message = audio
                    .error_message
                    .unwrap_or_else(|| "download failed: no output file".to_string());
                error!(
                    "[Merger] Audio stream failed, video kept at {}: {}",
                    video_path.display(),
                    message
                );
                return MergeResult::failed(message, Some(video_path), None);
            }
        };

        let output_path = task.destination_dir.join(OutputNamer::merged_name(&task.title));
        info!(
            "[Merger] {} + {} → {} via {}",
            video_path.display(),
            audio_path.display(),
            output_path.display(),
            self.muxer.name()
        );
        reporter.report(&DownloadProgress {
            percent: 100.0,
            status: "Merging video and audio...".to_string(),
        });

        match self.muxer.mux(&video_path, &audio_path, &output_path).await {
            Ok(()) => {
                info!("[Merger] ✓ Merged into {}", output_path.display());
                MergeResult {
                    success: true,
                    output_path: Some(output_path),
                    video_path: Some(video_path),
                    audio_path: Some(audio_path),
                    error_message: None,
                }
            }
            Err(e) => {
                let e = match e {
                    DownloadError::Mux(_) => e,
                    other => DownloadError::Mux(other.to_string()),
                };
                error!("[Merger] ✗ {}", e);
                MergeResult::failed(e.to_string(), Some(video_path), Some(audio_path))
            }
        }
    }

    fn stream_task(&self, task: &MergeTask, format_id: &str, extension: &str) -> DownloadTask {
        DownloadTask {
            url: task.url.clone(),
            format_id: format_id.to_string(),
            extension: extension.to_string(),
            destination_dir: task.destination_dir.clone(),
            title: task.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::EngineConfig;
    use crate::downloader::orchestrator::tests::FakeEngine;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeMuxer {
        stderr: Option<String>,
        calls: Arc<StdMutex<Vec<(PathBuf, PathBuf, PathBuf)>>>,
    }

    #[async_trait]
    impl Muxer for FakeMuxer {
        fn name(&self) -> &'static str {
            "fake-mux"
        }

        async fn mux(
            &self,
            video: &Path,
            audio: &Path,
            output: &Path,
        ) -> Result<(), DownloadError> {
            self.calls
                .lock()
                .unwrap()
                .push((video.to_path_buf(), audio.to_path_buf(), output.to_path_buf()));
            if let Some(stderr) = &self.stderr {
                return Err(DownloadError::Mux(stderr.clone()));
            }
            std::fs::write(output, b"merged").map_err(|e| DownloadError::Unexpected(e.to_string()))
        }
    }

    fn merge_task(dir: &Path) -> MergeTask {
        MergeTask {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            title: "Clip".to_string(),
            video_format_id: "136".to_string(),
            audio_format_id: "140".to_string(),
            destination_dir: dir.to_path_buf(),
        }
    }

    fn coordinator(engine: FakeEngine, muxer: FakeMuxer) -> MergeCoordinator {
        let downloader = Arc::new(DownloadOrchestrator::new(
            Box::new(engine),
            EngineConfig::default(),
        ));
        MergeCoordinator::new(downloader, Box::new(muxer))
    }

    #[tokio::test]
    async fn test_merge_success_keeps_stream_files() {
        let dir = tempfile::tempdir().unwrap();
        let muxer = FakeMuxer::default();
        let mux_calls = muxer.calls.clone();
        let coordinator = coordinator(FakeEngine::default(), muxer);
        let mut reporter = |_: &DownloadProgress| {};

        let result = coordinator.download_and_merge(&merge_task(dir.path()), &mut reporter).await;

        let video = dir.path().join("1_Clip.mp4");
        let audio = dir.path().join("2_Clip.m4a");
        let merged = dir.path().join("Clip_merged.mp4");
        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.output_path, Some(merged.clone()));
        assert!(merged.exists());
        assert!(video.exists() && audio.exists());
        assert_eq!(*mux_calls.lock().unwrap(), vec![(video, audio, merged)]);
    }

    #[tokio::test]
    async fn test_video_failure_skips_audio() {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            FakeEngine::failing("136", DownloadError::Transfer("HTTP Error 404".to_string()));
        let calls = engine.calls.clone();
        let muxer = FakeMuxer::default();
        let mux_calls = muxer.calls.clone();
        let coordinator = coordinator(engine, muxer);
        let mut reporter = |_: &DownloadProgress| {};

        let result = coordinator.download_and_merge(&merge_task(dir.path()), &mut reporter).await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("download failed: HTTP Error 404"));
        assert_eq!(*calls.lock().unwrap(), vec!["136"]);
        assert!(mux_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audio_failure_leaves_video_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::failing("140", DownloadError::Transfer("timed out".to_string()));
        let coordinator = coordinator(engine, FakeMuxer::default());
        let mut reporter = |_: &DownloadProgress| {};

        let result = coordinator.download_and_merge(&merge_task(dir.path()), &mut reporter).await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("download failed: timed out"));
        assert_eq!(result.video_path, Some(dir.path().join("1_Clip.mp4")));
        assert!(dir.path().join("1_Clip.mp4").exists());
        assert!(!dir.path().join("Clip_merged.mp4").exists());
    }

    #[tokio::test]
    async fn test_mux_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let muxer = FakeMuxer {
            stderr: Some("Invalid data found when processing input".to_string()),
            ..FakeMuxer::default()
        };
        let coordinator = coordinator(FakeEngine::default(), muxer);
        let mut reporter = |_: &DownloadProgress| {};

        let result = coordinator.download_and_merge(&merge_task(dir.path()), &mut reporter).await;

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("merge failed: Invalid data found when processing input")
        );
        assert!(result.audio_path.is_some());
    }
}
