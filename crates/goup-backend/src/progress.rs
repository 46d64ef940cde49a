use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

/// Receives byte counts while a download is streamed to disk.
pub trait ProgressSink: Send {
    fn on_progress(&mut self, downloaded: u64, total: Option<u64>);

    /// Called once after the last chunk has been written.
    fn finish(&mut self, downloaded: u64, total: Option<u64>) {
        let _ = (downloaded, total);
    }
}

/// Logs a status line at most once per wall-clock second, plus a final line
/// when the download completes.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_second: Option<u64>,
}

impl LogProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, downloaded: u64, total: Option<u64>, now_second: u64) -> Option<String> {
        if self.last_second == Some(now_second) {
            return None;
        }
        self.last_second = Some(now_second);
        Some(progress_line(downloaded, total))
    }
}

impl ProgressSink for LogProgress {
    fn on_progress(&mut self, downloaded: u64, total: Option<u64>) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        if let Some(line) = self.record(downloaded, total, now) {
            info!("{line}");
        }
    }

    fn finish(&mut self, downloaded: u64, total: Option<u64>) {
        info!("{}", progress_line(downloaded, total));
    }
}

#[allow(clippy::cast_precision_loss)]
fn progress_line(downloaded: u64, total: Option<u64>) -> String {
    match total.filter(|total| *total > 0) {
        Some(total) => {
            let percent = 100.0 * downloaded as f64 / total as f64;
            let width = total.to_string().len();
            let suffix = if downloaded == total { "" } else { " ..." };
            format!("Downloaded {percent:5.1}% ({downloaded:>width$} / {total} bytes){suffix}")
        }
        None => format!("Downloaded {downloaded} bytes ..."),
    }
}
