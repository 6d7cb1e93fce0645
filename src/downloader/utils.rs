// Helper functions for extractor and backend implementations

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::EngineConfig;

/// Run command with timeout (shared utility)
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DownloadError::from_spawn(program, &e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| {
            DownloadError::Unexpected(format!("Failed to capture stdout from {}", program))
        })?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| {
            DownloadError::Unexpected(format!("Failed to capture stderr from {}", program))
        })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let waited = timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                DownloadError::Unexpected(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Transfer(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::Unexpected(format!("{} task failed: {}", name, e)))?
        .map_err(|e| DownloadError::Unexpected(format!("Failed to read {}: {}", name, e)))
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(proxy: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        args.push("--proxy".to_string());
        args.push(proxy.to_string());
    }

    args
}

/// Build retry and timeout arguments for yt-dlp
pub fn get_retry_args(config: &EngineConfig) -> Vec<String> {
    vec![
        "--retries".to_string(),
        config.retries.to_string(),
        "--fragment-retries".to_string(),
        config.fragment_retries.to_string(),
        "--socket-timeout".to_string(),
        config.segment_timeout.as_secs().to_string(),
    ]
}

/// yt-dlp treats `-o` as an output template; keep literal `%` literal.
pub fn escape_output_template(path: &str) -> String {
    path.replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_args() {
        assert!(get_proxy_args(None).is_empty());
        assert!(get_proxy_args(Some("")).is_empty());
        assert_eq!(
            get_proxy_args(Some("socks5://127.0.0.1:1080")),
            vec!["--proxy", "socks5://127.0.0.1:1080"]
        );
    }

    #[test]
    fn test_retry_args_follow_config() {
        let args = get_retry_args(&EngineConfig::default());
        assert_eq!(
            args,
            vec!["--retries", "3", "--fragment-retries", "3", "--socket-timeout", "60"]
        );
    }

    #[test]
    fn test_escape_output_template() {
        assert_eq!(escape_output_template("out/1_100%_real.mp4"), "out/1_100%%_real.mp4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_output_captures_streams() {
        let out = run_output_with_timeout(
            "sh",
            vec!["-c".to_string(), "echo hi; echo oops >&2; exit 3".to_string()],
            10,
        )
        .await
        .unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hi");
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "oops");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_not_found() {
        let err = run_output_with_timeout("definitely-not-a-real-tool-xyz", vec![], 5)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DownloadError::ToolNotFound("definitely-not-a-real-tool-xyz".to_string())
        );
    }
}
