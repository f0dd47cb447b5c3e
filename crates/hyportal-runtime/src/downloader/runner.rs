//! Single-flight downloader invocations.

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hyportal_core::{AppEvent, AppEventEmitter, DownloadProgress, OutputStream};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DownloaderConfig, DownloaderError, parse_progress};
use crate::auth::{AuthMarkers, AuthWindowController, AuthWindowHandle, HytaleMarkers};
use crate::process::{OutputChunk, spawn_chunk_reader};
use crate::text::strip_ansi;

/// Buffered output still read after the process exits.
const OUTPUT_DRAIN: Duration = Duration::from_secs(1);

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloaderOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The one active invocation.
struct ActiveRun {
    cancel: CancellationToken,
    window: Option<AuthWindowHandle>,
}

type Slot = Arc<Mutex<Option<ActiveRun>>>;

fn lock(slot: &Slot) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frees the slot and closes any auth window when a run ends.
struct ActiveGuard {
    slot: Slot,
    windows: AuthWindowController,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let window = lock(&self.slot).take().and_then(|run| run.window);
        if let Some(window) = window {
            self.windows.close(&window);
        }
    }
}

/// Runs the downloader binary, one invocation at a time.
pub struct DownloaderRunner {
    config: DownloaderConfig,
    windows: AuthWindowController,
    emitter: Arc<dyn AppEventEmitter>,
    markers: Arc<dyn AuthMarkers>,
    active: Slot,
}

impl DownloaderRunner {
    pub fn new(
        config: DownloaderConfig,
        windows: AuthWindowController,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            config,
            windows,
            emitter,
            markers: Arc::new(HytaleMarkers),
            active: Slot::default(),
        }
    }

    #[must_use]
    pub fn with_markers(mut self, markers: Arc<dyn AuthMarkers>) -> Self {
        self.markers = markers;
        self
    }

    pub const fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// An invocation is in flight.
    pub fn is_busy(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Run the downloader with `args` and collect its output.
    pub async fn run(&self, args: &[&str]) -> Result<DownloaderOutput, DownloaderError> {
        self.run_with_progress(args, |_| {}).await
    }

    /// Run the downloader, reporting parsed progress markers.
    ///
    /// Fails with `Busy` at once if another run is active. The first device
    /// verification URL in the output opens a modal auth window; closing
    /// that window kills the downloader.
    pub async fn run_with_progress<F>(
        &self,
        args: &[&str],
        mut on_progress: F,
    ) -> Result<DownloaderOutput, DownloaderError>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let cancel = CancellationToken::new();
        let _guard = self.claim(cancel.clone())?;

        if !tokio::fs::try_exists(&self.config.binary).await.unwrap_or(false) {
            return Err(DownloaderError::BinaryMissing(self.config.binary.clone()));
        }
        #[cfg(unix)]
        ensure_executable(&self.config.binary).await;

        debug!(binary = %self.config.binary.display(), args = ?args, "Running downloader");
        let mut child = Command::new(&self.config.binary)
            .args(args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DownloaderError::Spawn)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_chunk_reader(stdout, OutputStream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_chunk_reader(stderr, OutputStream::Stderr, tx.clone());
        }
        drop(tx);

        let mut session = RunSession {
            output: DownloaderOutput::default(),
            auth_notified: false,
        };
        let mut kill_sent = false;

        let status = loop {
            let step = tokio::select! {
                Some(chunk) = rx.recv() => Step::Output(chunk),
                () = cancel.cancelled(), if !kill_sent => Step::Cancel,
                status = child.wait() => Step::Exited(status),
            };
            match step {
                Step::Output(chunk) => {
                    self.handle_chunk(&mut session, &chunk, &cancel, &mut on_progress);
                }
                Step::Cancel => {
                    info!("Cancelling downloader run");
                    kill_sent = true;
                    if let Err(e) = child.start_kill() {
                        debug!(error = %e, "Downloader already gone");
                    }
                }
                Step::Exited(status) => break status?,
            }
        };

        let drain = async {
            while let Some(chunk) = rx.recv().await {
                self.handle_chunk(&mut session, &chunk, &cancel, &mut on_progress);
            }
        };
        if tokio::time::timeout(OUTPUT_DRAIN, drain).await.is_err() {
            debug!("Downloader output still open after exit");
        }

        if status.success() {
            return Ok(session.output);
        }
        if cancel.is_cancelled() {
            return Err(DownloaderError::Cancelled);
        }
        warn!(status = %status, "Downloader failed");
        Err(DownloaderError::Exited {
            code: status.code(),
            stderr: session.output.stderr,
        })
    }

    /// Close the auth window and kill the active run, if any.
    ///
    /// Returns whether a run was active.
    pub fn cancel(&self) -> bool {
        let (cancel, window) = {
            let mut slot = lock(&self.active);
            match slot.as_mut() {
                Some(run) => (run.cancel.clone(), run.window.take()),
                None => return false,
            }
        };
        if let Some(window) = window {
            self.windows.close(&window);
        }
        cancel.cancel();
        true
    }

    fn claim(&self, cancel: CancellationToken) -> Result<ActiveGuard, DownloaderError> {
        let mut slot = lock(&self.active);
        if slot.is_some() {
            return Err(DownloaderError::Busy);
        }
        *slot = Some(ActiveRun {
            cancel,
            window: None,
        });
        Ok(ActiveGuard {
            slot: Arc::clone(&self.active),
            windows: self.windows.clone(),
        })
    }

    fn handle_chunk<F>(
        &self,
        session: &mut RunSession,
        chunk: &OutputChunk,
        cancel: &CancellationToken,
        on_progress: &mut F,
    ) where
        F: FnMut(DownloadProgress),
    {
        match chunk.stream {
            OutputStream::Stdout => session.output.stdout.push_str(&chunk.text),
            OutputStream::Stderr => session.output.stderr.push_str(&chunk.text),
        }

        if !session.auth_notified {
            if let Some(url) = self.markers.downloader_auth_url(&strip_ansi(&chunk.text)) {
                session.auth_notified = true;
                self.open_auth_window(&url, cancel);
            }
        }

        if let Some(progress) = parse_progress(&chunk.text) {
            on_progress(progress);
        }
    }

    fn open_auth_window(&self, url: &str, cancel: &CancellationToken) {
        info!(url = %url, "Downloader requested device authorization");
        self.emitter.emit(AppEvent::AuthUrl {
            url: url.to_string(),
        });

        let on_closed = cancel.clone();
        match self.windows.open(url, true, move || on_closed.cancel()) {
            Ok(handle) => {
                let mut slot = lock(&self.active);
                if let Some(run) = slot.as_mut() {
                    run.window = Some(handle);
                }
            }
            Err(e) => warn!(error = %e, "Failed to open downloader auth window"),
        }
    }
}

/// Archives do not always keep the executable bit.
#[cfg(unix)]
async fn ensure_executable(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::Permissions::from_mode(0o755);
    if let Err(e) = tokio::fs::set_permissions(path, mode).await {
        debug!(path = %path.display(), error = %e, "Could not mark downloader executable");
    }
}

enum Step {
    Output(OutputChunk),
    Cancel,
    Exited(std::io::Result<std::process::ExitStatus>),
}

struct RunSession {
    output: DownloaderOutput,
    auth_notified: bool,
}
