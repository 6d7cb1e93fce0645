// Configuration store
//
// Settings live in a TOML file. Updates go through `ConfigKey`: only the
// enumerated keys are accepted, each with a typed value.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::ExtractionOptions;
use crate::downloader::models::EngineConfig;

pub const CONFIG_ENV_VAR: &str = "MEDIA_DOWNLOADER_CONFIG";

/// Title/description normalization applied by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LangConvert {
    /// Convert to Simplified Chinese
    #[serde(rename = "zh-cn")]
    ZhCn,
}

impl LangConvert {
    pub fn convert(&self, text: &str) -> String {
        match self {
            Self::ZhCn => zhconv::zhconv(text, zhconv::Variant::ZhCN),
        }
    }
}

impl fmt::Display for LangConvert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZhCn => write!(f, "zh-cn"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Proxy handed to yt-dlp (http, https, socks5)
    #[serde(default)]
    pub proxy: Option<String>,
    /// Where downloads are written
    #[serde(default = "default_download_dir", rename = "download_directory")]
    pub download_dir: PathBuf,
    #[serde(default)]
    pub langconvert: Option<LangConvert>,
    #[serde(default, rename = "yt_dlp_options")]
    pub extraction: ExtractionOptions,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            download_dir: default_download_dir(),
            langconvert: None,
            extraction: ExtractionOptions::default(),
        }
    }
}

impl AppConfig {
    /// Title or description as shown to the user, after `langconvert`.
    pub fn display_text(&self, text: &str) -> String {
        match self.langconvert {
            Some(conversion) => conversion.convert(text),
            None => text.to_string(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_proxy(self.proxy.clone())
    }

    /// Apply one validated update.
    pub fn apply(&mut self, key: ConfigKey, value: &str) -> Result<(), DownloadError> {
        let value = value.trim();
        match key {
            ConfigKey::Proxy => self.proxy = parse_proxy(value)?,
            ConfigKey::DownloadDir => {
                if value.is_empty() {
                    return Err(DownloadError::Config("download_dir cannot be empty".to_string()));
                }
                self.download_dir = PathBuf::from(value);
            }
            ConfigKey::Format => {
                if value.is_empty() {
                    return Err(DownloadError::Config("format cannot be empty".to_string()));
                }
                self.extraction.format = value.to_string();
            }
            ConfigKey::NoPlaylist => self.extraction.noplaylist = parse_bool(key, value)?,
            ConfigKey::Quiet => self.extraction.quiet = parse_bool(key, value)?,
            ConfigKey::LangConvert => {
                self.langconvert = match value.to_lowercase().as_str() {
                    "" | "none" | "off" => None,
                    "zh-cn" => Some(LangConvert::ZhCn),
                    other => {
                        return Err(DownloadError::Config(format!(
                            "unsupported langconvert value '{}' (expected zh-cn or none)",
                            other
                        )))
                    }
                };
            }
        }
        Ok(())
    }

    /// Apply a `key=value` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<ConfigKey, DownloadError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            DownloadError::Config(format!("expected key=value, got '{}'", assignment))
        })?;
        let key: ConfigKey = key.parse()?;
        self.apply(key, value)?;
        Ok(key)
    }
}

/// The settable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Proxy,
    DownloadDir,
    Format,
    NoPlaylist,
    Quiet,
    LangConvert,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        Self::Proxy,
        Self::DownloadDir,
        Self::Format,
        Self::NoPlaylist,
        Self::Quiet,
        Self::LangConvert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::DownloadDir => "download_dir",
            Self::Format => "format",
            Self::NoPlaylist => "noplaylist",
            Self::Quiet => "quiet",
            Self::LangConvert => "langconvert",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                DownloadError::Config(format!(
                    "unknown key '{}' (known: {})",
                    s.trim(),
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(key: ConfigKey, value: &str) -> Result<bool, DownloadError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(DownloadError::Config(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_proxy(value: &str) -> Result<Option<String>, DownloadError> {
    if value.is_empty() {
        return Ok(None);
    }
    reqwest::Proxy::all(value)
        .map_err(|e| DownloadError::Config(format!("invalid proxy '{}': {}", value, e)))?;
    Ok(Some(value.to_string()))
}

/// Where the config file lives
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .map(|d| d.join("media-downloader").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Config file plus its loaded contents
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    /// Load from `path`; a missing file gives the defaults.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        let path = path.into();
        let config = match fs::read_to_string(&path).await {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                DownloadError::Config(format!("cannot parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("[Config] {} not found, using defaults", path.display());
                AppConfig::default()
            }
            Err(e) => {
                return Err(DownloadError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn save(&self) -> Result<(), DownloadError> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| DownloadError::Config(format!("cannot serialize config: {}", e)))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| {
                    DownloadError::Config(format!("cannot create {}: {}", parent.display(), e))
                })?;
        }
        fs::write(&self.path, content)
            .await
            .map_err(|e| {
                DownloadError::Config(format!("cannot write {}: {}", self.path.display(), e))
            })
    }

    /// Validate, apply and persist one `key=value` update.
    pub async fn update(&mut self, assignment: &str) -> Result<ConfigKey, DownloadError> {
        let key = self.config.apply_assignment(assignment)?;
        self.save().await?;
        info!("[Config] {} updated in {}", key, self.path.display());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.download_dir, PathBuf::from("output"));
        assert_eq!(config.extraction.format, "bestvideo+bestaudio/best");
        assert!(config.extraction.noplaylist);
        assert!(config.extraction.quiet);
        assert_eq!(config.proxy, None);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_typed_updates() {
        let mut config = AppConfig::default();
        config.apply_assignment("proxy=http://127.0.0.1:7890").unwrap();
        config.apply_assignment("noplaylist=false").unwrap();
        config.apply_assignment("QUIET = no").unwrap();
        config.apply_assignment("format=bestvideo[height<=720]+bestaudio").unwrap();
        config.apply_assignment("langconvert=zh-cn").unwrap();

        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(config.engine_config().proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert!(!config.extraction.noplaylist);
        assert!(!config.extraction.quiet);
        assert_eq!(config.extraction.format, "bestvideo[height<=720]+bestaudio");
        assert_eq!(config.langconvert, Some(LangConvert::ZhCn));

        config.apply_assignment("proxy=").unwrap();
        assert_eq!(config.proxy, None);
    }

    #[test]
    fn test_display_text_follows_langconvert() {
        let mut config = AppConfig::default();
        assert_eq!(config.display_text("中國電影"), "中國電影");

        config.apply_assignment("langconvert=zh-cn").unwrap();
        assert_eq!(config.display_text("中國電影"), "中国电影");
        assert_eq!(config.display_text("Never Gonna"), "Never Gonna");

        config.apply_assignment("langconvert=none").unwrap();
        assert_eq!(config.display_text("中國電影"), "中國電影");
    }

    #[test]
    fn test_rejected_updates_leave_config_untouched() {
        let mut config = AppConfig::default();
        for bad in [
            "noplaylist=__import__('os')",
            "cookies=chrome",
            "quiet",
            "langconvert=zh-tw",
            "download_dir=",
        ] {
            assert!(
                matches!(config.apply_assignment(bad), Err(DownloadError::Config(_))),
                "{} should be rejected",
                bad
            );
        }
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_toml_key_names() {
        let config: AppConfig = toml::from_str(
            r#"
            proxy = "socks5://127.0.0.1:1080"
            download_directory = "videos"
            langconvert = "zh-cn"

            [yt_dlp_options]
            format = "best"
            "#,
        )
        .unwrap();

        assert_eq!(config.download_dir, PathBuf::from("videos"));
        assert_eq!(config.extraction.format, "best");
        assert!(config.extraction.noplaylist);
        assert_eq!(config.langconvert, Some(LangConvert::ZhCn));
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut store = ConfigStore::load(&path).await.unwrap();
        assert_eq!(store.config(), &AppConfig::default());

        store.update("download_dir=/tmp/media").await.unwrap();
        let reloaded = ConfigStore::load(&path).await.unwrap();
        assert_eq!(reloaded.config().download_dir, PathBuf::from("/tmp/media"));
    }
}
