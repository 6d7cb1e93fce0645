// ProgressTracker - turns raw engine events into a bounded ProgressState
//
// Called synchronously from inside the transfer; owns the state of exactly
// one task and forwards a status line to the presentation layer.

use super::models::{DownloadProgress, ProgressState};
use super::traits::{ProgressEvent, ProgressReporter, ProgressSink, TransferStatus};

const SIZE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

pub struct ProgressTracker<'a> {
    state: ProgressState,
    reporter: &'a mut (dyn ProgressReporter + 'a),
}

impl<'a> ProgressTracker<'a> {
    pub fn new(reporter: &'a mut (dyn ProgressReporter + 'a)) -> Self {
        Self {
            state: ProgressState::default(),
            reporter,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Zero the state; done at the start of every task.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
    }

    /// Apply one event. Returns the status line for `downloading` events,
    /// `None` for everything else.
    pub fn on_event(&mut self, event: &ProgressEvent) -> Option<String> {
        if event.status != TransferStatus::Downloading {
            return None;
        }

        // Unknown or zero total behaves like a total of one byte
        let total = event.total_bytes.filter(|t| *t > 0).unwrap_or(1);
        let fraction = (event.downloaded_bytes as f64 / total as f64).clamp(0.0, 1.0);

        self.state = ProgressState {
            fraction_complete: fraction,
            downloaded_bytes: event.downloaded_bytes,
            total_bytes: event.total_bytes,
            speed_bytes_per_sec: event.speed_bytes_per_sec,
            eta_seconds: event.eta_seconds,
        };

        let line = status_line(&self.state);
        self.reporter.report(&DownloadProgress {
            percent: (fraction * 100.0) as f32,
            status: line.clone(),
        });
        Some(line)
    }

    /// Push a free-form status (start/finish notices) without touching the state.
    pub fn notify(&mut self, status: impl Into<String>) {
        self.reporter.report(&DownloadProgress {
            percent: (self.state.fraction_complete * 100.0) as f32,
            status: status.into(),
        });
    }
}

impl ProgressSink for ProgressTracker<'_> {
    fn on_event(&mut self, event: &ProgressEvent) {
        ProgressTracker::on_event(self, event);
    }
}

pub fn status_line(state: &ProgressState) -> String {
    format!(
        "Downloaded: {}, Speed: {}/s, ETA: {}",
        format_size(Some(state.downloaded_bytes as f64)),
        format_size(state.speed_bytes_per_sec),
        format_eta(state.eta_seconds)
    )
}

/// Human-readable byte count, two decimals, binary units.
pub fn format_size(size: Option<f64>) -> String {
    let mut size = match size {
        Some(s) if s > 0.0 && s.is_finite() => s,
        _ => return "Size unknown".to_string(),
    };

    let mut unit = SIZE_UNITS[0];
    for next in &SIZE_UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", size, unit)
}

/// "MM:SS" or "H:MM:SS"; "unknown" when the engine has no estimate.
pub fn format_eta(eta_seconds: Option<u64>) -> String {
    match eta_seconds {
        None => "unknown".to_string(),
        Some(secs) => {
            let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
            if h > 0 {
                format!("{}:{:02}:{:02}", h, m, s)
            } else {
                format!("{:02}:{:02}", m, s)
            }
        }
    }
}
