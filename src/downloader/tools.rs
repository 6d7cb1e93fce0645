// External tool discovery: yt-dlp for extraction/transfer, ffmpeg for muxing

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Install locations checked before `$PATH` (Homebrew on Apple Silicon first).
const EXTRA_BIN_DIRS: [&str; 3] = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub const ALL: [ToolType; 2] = [ToolType::YtDlp, ToolType::Ffmpeg];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    /// Variable that pins the binary, e.g. `MEDIA_DOWNLOADER_FFMPEG=/opt/ffmpeg/bin/ffmpeg`
    pub fn env_override(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "MEDIA_DOWNLOADER_YTDLP",
            ToolType::Ffmpeg => "MEDIA_DOWNLOADER_FFMPEG",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

impl fmt::Display for ToolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "{:<8} {} ({})",
                self.name,
                self.version.as_deref().unwrap_or("unknown version"),
                path
            ),
            None => write!(f, "{:<8} not found", self.name),
        }
    }
}

#[derive(Debug, Default)]
pub struct ToolManager;

impl ToolManager {
    pub fn new() -> Self {
        Self
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.find_binary(&tool_type);
        let version = path
            .as_deref()
            .and_then(|p| self.probe_version(p, &tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        ToolType::ALL
            .into_iter()
            .map(|t| self.get_tool_info(t))
            .collect()
    }

    /// Path to launch the tool with; the bare name when nothing was found.
    pub fn binary_path(&self, tool_type: &ToolType) -> String {
        self.find_binary(tool_type)
            .unwrap_or_else(|| tool_type.as_str().to_string())
    }

    fn find_binary(&self, tool_type: &ToolType) -> Option<String> {
        if let Ok(pinned) = std::env::var(tool_type.env_override()) {
            if Path::new(&pinned).is_file() {
                return Some(pinned);
            }
            debug!("[Tools] {} points at missing {}", tool_type.env_override(), pinned);
        }

        let path_dirs = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
            .unwrap_or_default();
        let found = EXTRA_BIN_DIRS
            .iter()
            .map(PathBuf::from)
            .chain(path_dirs)
            .map(|dir| dir.join(executable_name(tool_type)))
            .find(|candidate| candidate.is_file())?;

        Some(found.to_string_lossy().into_owned())
    }

    /// First line of the tool's version output; `None` if it cannot run.
    pub fn probe_version(&self, path: &str, tool_type: &ToolType) -> Option<String> {
        let output = Command::new(path).arg(tool_type.version_arg()).output().ok()?;
        if !output.status.success() {
            return None;
        }
        // ffmpeg follows the version line with its whole build configuration
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
    }
}

fn executable_name(tool_type: &ToolType) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool_type.as_str())
    } else {
        tool_type.as_str().to_string()
    }
}
