use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use media_downloader_lib::config::{default_config_path, AppConfig, ConfigKey, ConfigStore};
use media_downloader_lib::downloader::backends::{FfmpegMuxer, YtDlpEngine};
use media_downloader_lib::downloader::extractors::CliInfoExtractor;
use media_downloader_lib::downloader::tools::ToolManager;
use media_downloader_lib::downloader::{
    fetch_formats, DownloadOrchestrator, DownloadProgress, FetchedMedia, FormatRecord,
    FormatSelector, MergeCoordinator, MergeTask,
};

const USAGE: &str = "\
usage: media-downloader <command>

commands:
  formats URL                        list the downloadable video and audio streams
  download URL FORMAT_ID...          download each selected stream
  merge URL VIDEO_ID AUDIO_ID        download one video and one audio stream and mux them
  config show                        print the current configuration
  config set KEY=VALUE               update one setting
  tools                              show yt-dlp / ffmpeg availability";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let store = ConfigStore::load(default_config_path()).await?;

    match command.as_str() {
        "formats" => {
            let [url] = rest else { bail!("formats expects a URL\n\n{}", USAGE) };
            let media = fetch(&store, url).await?;
            print_media(store.config(), &media);
        }
        "download" => {
            let (url, ids) = rest
                .split_first()
                .filter(|(_, ids)| !ids.is_empty())
                .ok_or_else(|| {
                    anyhow!("download expects a URL and at least one format id\n\n{}", USAGE)
                })?;
            download(&store, url, ids).await?;
        }
        "merge" => {
            let [url, video_id, audio_id] = rest else {
                bail!("merge expects URL VIDEO_ID AUDIO_ID\n\n{}", USAGE)
            };
            merge(&store, url, video_id, audio_id).await?;
        }
        "config" => config_command(store, rest).await?,
        "tools" => {
            for tool in ToolManager::new().get_all_tools() {
                println!("{}", tool);
            }
        }
        "help" | "-h" | "--help" => println!("{}", USAGE),
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}

async fn fetch(store: &ConfigStore, url: &str) -> Result<FetchedMedia> {
    let config = store.config();
    let extractor = CliInfoExtractor::new();
    let media = fetch_formats(&extractor, url, &config.extraction, config.proxy.as_deref()).await?;
    Ok(media)
}

fn print_media(config: &AppConfig, media: &FetchedMedia) {
    println!("Title: {}", config.display_text(&media.title));
    println!("Description: {}", config.display_text(&media.description));
    println!("\nVideo formats:");
    for option in FormatSelector::build_options(&media.video_formats, false) {
        println!("  {}", option.label);
    }
    println!("\nAudio formats:");
    for option in FormatSelector::build_options(&media.audio_formats, true) {
        println!("  {}", option.label);
    }
}

fn orchestrator(store: &ConfigStore) -> DownloadOrchestrator {
    DownloadOrchestrator::new(Box::new(YtDlpEngine::new()), store.config().engine_config())
}

fn print_progress(progress: &DownloadProgress) {
    println!("[{:>5.1}%] {}", progress.percent, progress.status);
}

async fn download(store: &ConfigStore, url: &str, ids: &[String]) -> Result<()> {
    let media = fetch(store, url).await?;
    let selections = ids
        .iter()
        .map(|id| {
            media
                .find(id)
                .cloned()
                .ok_or_else(|| anyhow!("format {} is not among the offered streams", id))
        })
        .collect::<Result<Vec<FormatRecord>>>()?;

    let dir = &store.config().download_dir;
    let mut reporter = print_progress;
    let results = orchestrator(store)
        .download_selected(url, &media.title, dir, &selections, &mut reporter)
        .await;

    let mut failures = 0;
    for (record, result) in selections.iter().zip(&results) {
        match (&result.file_path, &result.error_message) {
            (Some(path), _) if result.success => {
                println!("✓ {} → {}", record.format_id, path.display())
            }
            (_, message) => {
                failures += 1;
                println!(
                    "✗ {}: {}",
                    record.format_id,
                    message.as_deref().unwrap_or("download failed")
                );
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} downloads failed", failures, results.len());
    }
    Ok(())
}

async fn merge(store: &ConfigStore, url: &str, video_id: &str, audio_id: &str) -> Result<()> {
    let media = fetch(store, url).await?;
    if !media.video_formats.iter().any(|f| f.format_id == video_id) {
        bail!("{} is not an offered video stream", video_id);
    }
    if !media.audio_formats.iter().any(|f| f.format_id == audio_id) {
        bail!("{} is not an offered audio stream", audio_id);
    }

    let coordinator =
        MergeCoordinator::new(Arc::new(orchestrator(store)), Box::new(FfmpegMuxer::new()));
    let task = MergeTask {
        url: url.to_string(),
        title: media.title.clone(),
        video_format_id: video_id.to_string(),
        audio_format_id: audio_id.to_string(),
        destination_dir: store.config().download_dir.clone(),
    };

    let mut reporter = print_progress;
    let result = coordinator.download_and_merge(&task, &mut reporter).await;
    match (result.success, result.output_path) {
        (true, Some(path)) => {
            println!("✓ Merged into {}", path.display());
            Ok(())
        }
        _ => Err(anyhow!(result
            .error_message
            .unwrap_or_else(|| "merge failed".to_string()))),
    }
}

async fn config_command(mut store: ConfigStore, rest: &[String]) -> Result<()> {
    match rest {
        [sub] if sub == "show" => {
            println!("# {}", store.path().display());
            let rendered = toml::to_string_pretty(store.config()).context("cannot render config")?;
            print!("{}", rendered);
        }
        [sub, assignment] if sub == "set" => {
            let key = store.update(assignment).await?;
            info!("Saved {} to {}", key, store.path().display());
        }
        _ => {
            let keys: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
            bail!("config expects `show` or `set KEY=VALUE` (keys: {})", keys.join(", "));
        }
    }
    Ok(())
}
