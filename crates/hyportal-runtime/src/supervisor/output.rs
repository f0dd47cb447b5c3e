//! Per-server output pump: forwards output and drives the auth scanner.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use hyportal_core::{AppEvent, AppEventEmitter, OutputStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::record::{StderrTail, WindowSlot};
use crate::auth::{
    AuthAction, AuthFileLocator, AuthWindowController, AuthWindowHandle, OutputAuthScanner,
};
use crate::process::OutputChunk;

pub struct OutputPump {
    pub id: String,
    pub working_dir: PathBuf,
    pub emitter: Arc<dyn AppEventEmitter>,
    pub scanner: OutputAuthScanner,
    pub windows: AuthWindowController,
    pub window: WindowSlot,
    pub stdin: mpsc::UnboundedSender<String>,
    pub tail: Arc<Mutex<StderrTail>>,
}

impl OutputPump {
    /// Consume chunks in arrival order until both readers are done.
    pub async fn run(mut self, mut chunks: mpsc::UnboundedReceiver<OutputChunk>) {
        while let Some(chunk) = chunks.recv().await {
            if chunk.stream == OutputStream::Stderr {
                self.tail
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(&chunk.text);
            }
            self.emitter.emit(AppEvent::server_output(
                &self.id,
                chunk.stream,
                chunk.text.as_str(),
            ));

            self.sync_window_state();
            let actions = self.scanner.feed(&chunk.text);
            self.apply(actions).await;
        }
        let actions = self.scanner.flush();
        self.apply(actions).await;
        debug!(id = %self.id, "output pump finished");
    }

    /// Notice a window the user closed since the last chunk.
    fn sync_window_state(&mut self) {
        let mut slot = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(AuthWindowHandle::is_closed) {
            *slot = None;
            self.scanner.window_closed();
        }
    }

    async fn apply(&mut self, actions: Vec<AuthAction>) {
        let mut queue: VecDeque<AuthAction> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                AuthAction::VerifyAuthFile => {
                    let exists = AuthFileLocator::locate(&self.working_dir).await.exists;
                    debug!(id = %self.id, exists, "Checked for auth file after token prompt");
                    queue.extend(self.scanner.auth_file_checked(exists));
                }
                AuthAction::SendInput(command) => {
                    if self.stdin.send(command.clone()).is_ok() {
                        info!(id = %self.id, command = %command.trim_end(), "Sent auth command");
                        self.emitter
                            .emit(AppEvent::server_auto_input(&self.id, command));
                    } else {
                        debug!(id = %self.id, "stdin closed, auth command dropped");
                    }
                }
                AuthAction::OpenWindow(url) => match self.windows.open(&url, false, || {}) {
                    Ok(handle) => {
                        info!(id = %self.id, url = %url, "Opened device auth window");
                        *self.window.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(handle);
                    }
                    Err(e) => {
                        warn!(id = %self.id, error = %e, "Failed to open device auth window");
                        self.scanner.window_closed();
                    }
                },
                AuthAction::CloseWindow => {
                    let handle = self
                        .window
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take();
                    if let Some(handle) = handle {
                        self.windows.close(&handle);
                    }
                }
            }
        }
    }
}
