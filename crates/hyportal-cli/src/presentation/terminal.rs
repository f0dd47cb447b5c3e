//! Renders `AppEvent`s on the terminal.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use hyportal_core::{AppEvent, AppEventEmitter, OutputStream, ServerStatus};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Notify;

/// Prints server output verbatim and shows download progress as a bar.
#[derive(Clone, Default)]
pub struct TerminalEmitter {
    bar: Arc<Mutex<Option<ProgressBar>>>,
    stopped: Arc<Notify>,
}

impl TerminalEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves after the next `stopped` status event (or a pending one).
    pub async fn server_stopped(&self) {
        self.stopped.notified().await;
    }

    /// Finish and remove the progress bar, if one is showing.
    pub fn finish_progress(&self) {
        let bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }

    fn progress(&self, message: &str, position: u64, length: u64) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(length);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
            ) {
                bar.set_style(style.progress_chars("█▓░"));
            }
            bar.set_message(message.to_string());
            bar
        });
        if length > 0 {
            bar.set_length(length);
        }
        bar.set_position(position);
    }
}

impl AppEventEmitter for TerminalEmitter {
    fn emit(&self, event: AppEvent) {
        match event {
            AppEvent::ServerOutput { stream, data, .. } => {
                let written = match stream {
                    OutputStream::Stdout => {
                        let mut out = std::io::stdout().lock();
                        out.write_all(data.as_bytes()).and_then(|()| out.flush())
                    }
                    OutputStream::Stderr => {
                        let mut err = std::io::stderr().lock();
                        err.write_all(data.as_bytes()).and_then(|()| err.flush())
                    }
                };
                if let Err(e) = written {
                    tracing::debug!(error = %e, "Terminal write failed");
                }
            }
            AppEvent::ServerStatus { id, status, error } => {
                match (status, error) {
                    (ServerStatus::Running, _) => eprintln!("▶ Server '{id}' is running"),
                    (ServerStatus::Stopped, None) => eprintln!("■ Server '{id}' stopped"),
                    (ServerStatus::Stopped, Some(error)) => {
                        eprintln!("✖ Server '{id}' stopped unexpectedly:\n{error}");
                    }
                }
                if status == ServerStatus::Stopped {
                    self.stopped.notify_one();
                }
            }
            AppEvent::ServerAutoInput { data, .. } => eprintln!("» {}", data.trim_end()),
            AppEvent::AuthUrl { url } => {
                eprintln!("The downloader needs you to sign in: {url}");
            }
            AppEvent::VersionProgress {
                id, loaded, total, ..
            } => {
                if let (Some(loaded), Some(total)) = (loaded, total) {
                    self.progress(&id, loaded, total);
                }
            }
            AppEvent::DownloadProgress { loaded, total } => {
                self.progress("hytale-downloader", loaded, total);
            }
        }
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn stopped_event_is_remembered() {
        let emitter = TerminalEmitter::new();
        emitter.emit(AppEvent::server_stopped("alpha", None));
        tokio_test::block_on(emitter.server_stopped());
    }

    #[test]
    fn progress_bar_tracks_downloads() {
        let emitter = TerminalEmitter::new();
        emitter.emit(AppEvent::DownloadProgress {
            loaded: 10,
            total: 100,
        });
        emitter.emit(AppEvent::DownloadProgress {
            loaded: 60,
            total: 100,
        });
        {
            let guard = emitter.bar.lock().unwrap();
            let bar = guard.as_ref().unwrap();
            assert_eq!(bar.position(), 60);
            assert_eq!(bar.length(), Some(100));
        }
        emitter.finish_progress();
        assert!(emitter.bar.lock().unwrap().is_none());
    }
}
