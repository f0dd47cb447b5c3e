//! Server process lifecycle.
//!
//! `ServerSupervisor` owns every running server. Each start spawns three
//! tasks: a stdin writer, an output pump (forwarding output and driving the
//! auth scanner) and an exit watcher. The exit watcher owns the `Child`; a
//! `stop()` asks it to run the SIGTERM → SIGKILL shutdown and then waits
//! until the exit has been fully reported.
//!
//! The one automatic retry: when a server that used the AOT cache dies with
//! `aotcache` in its recent stderr, it is started again once without it.

mod launch;
mod output;
mod record;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, join_all};
use hyportal_core::{
    AppEvent, AppEventEmitter, AppPaths, JavaRuntimeError, OutputStream, RunningServer,
    ServerError, StartServerRequest, domain::now_ms,
};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{AuthFileLocator, AuthMarkers, AuthWindowController, HytaleMarkers, OutputAuthScanner};
use crate::java::JavaRuntimeResolver;
use crate::process::{DEFAULT_GRACE_PERIOD, is_port_available, shutdown_child, spawn_chunk_reader};
use crate::text::normalize_terminal_input;

pub use launch::{AOT_CACHE, ASSETS_ARCHIVE, SERVER_JAR, ServerFiles, build_args, exit_message};
use output::OutputPump;
use record::{ServerProcessRecord, SharedRegistry, StartReservation, StderrTail, WindowSlot, lock};

/// Stderr characters kept for the AOT heuristic and exit diagnostics.
pub const STDERR_TAIL_CHARS: usize = 4000;

/// Tunables for the supervisor.
#[derive(Clone)]
pub struct SupervisorConfig {
    /// Time between SIGTERM and SIGKILL on `stop()`.
    pub grace_period: Duration,
    pub stderr_tail_chars: usize,
    /// Installed versions, for `Assets.zip` lookup by version id.
    pub versions_dir: Option<PathBuf>,
    /// How long to wait for buffered output after the process exits.
    pub output_drain_timeout: Duration,
    pub markers: Arc<dyn AuthMarkers>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            stderr_tail_chars: STDERR_TAIL_CHARS,
            versions_dir: None,
            output_drain_timeout: Duration::from_secs(1),
            markers: Arc::new(HytaleMarkers),
        }
    }
}

impl SupervisorConfig {
    pub fn from_paths(paths: &AppPaths) -> Self {
        Self {
            versions_dir: Some(paths.versions_dir()),
            ..Self::default()
        }
    }
}

/// Owns the running server processes.
#[derive(Clone)]
pub struct ServerSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    java: Arc<JavaRuntimeResolver>,
    windows: AuthWindowController,
    emitter: Arc<dyn AppEventEmitter>,
    config: SupervisorConfig,
    registry: SharedRegistry,
    next_instance: AtomicU64,
}

/// Everything the exit watcher needs after the process ends.
struct ExitWatch {
    instance: u64,
    request: StartServerRequest,
    child: Child,
    stop_rx: oneshot::Receiver<()>,
    exited_tx: watch::Sender<bool>,
    pump: JoinHandle<()>,
    tail: Arc<Mutex<StderrTail>>,
}

impl ServerSupervisor {
    pub fn new(
        java: Arc<JavaRuntimeResolver>,
        windows: AuthWindowController,
        emitter: Arc<dyn AppEventEmitter>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                java,
                windows,
                emitter,
                config,
                registry: SharedRegistry::default(),
                next_instance: AtomicU64::new(1),
            }),
        }
    }

    pub fn java_runtime(&self) -> &Arc<JavaRuntimeResolver> {
        &self.inner.java
    }

    /// Validate, spawn and register a server.
    ///
    /// Resolves once the process has been spawned; the `running` event has
    /// been emitted by then.
    pub async fn start(&self, request: StartServerRequest) -> Result<(), ServerError> {
        Arc::clone(&self.inner).launch(request).await
    }

    /// Stop a server: SIGTERM, then SIGKILL after the grace period.
    ///
    /// Untracked ids succeed without doing anything.
    pub async fn stop(&self, id: &str) -> Result<(), ServerError> {
        if id.is_empty() {
            return Err(ServerError::MissingId);
        }
        let (stop_tx, mut exited) = {
            let mut registry = lock(&self.inner.registry);
            let Some(record) = registry.running.get_mut(id) else {
                debug!(id = %id, "stop requested for untracked server");
                return Ok(());
            };
            (record.stop_tx.take(), record.exited.clone())
        };
        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.send(());
        }
        // Err only if the watcher vanished, which also means it is gone.
        let _ = exited.wait_for(|done| *done).await;
        Ok(())
    }

    /// Stop every tracked server, ignoring individual failures.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = lock(&self.inner.registry).running.keys().cloned().collect();
        if ids.is_empty() {
            return;
        }
        info!(count = ids.len(), "Stopping all servers");
        let results = join_all(ids.iter().map(|id| self.stop(id))).await;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                debug!(id = %id, error = %e, "Ignoring stop failure during shutdown");
            }
        }
    }

    /// `{id, statusSince}` for every tracked server, oldest first.
    pub fn snapshot(&self) -> Vec<RunningServer> {
        let mut servers: Vec<RunningServer> = lock(&self.inner.registry)
            .running
            .iter()
            .map(|(id, record)| RunningServer {
                id: id.clone(),
                status_since: record.status_since,
            })
            .collect();
        servers.sort_by(|a, b| {
            a.status_since
                .cmp(&b.status_since)
                .then_with(|| a.id.cmp(&b.id))
        });
        servers
    }

    pub fn is_running(&self, id: &str) -> bool {
        lock(&self.inner.registry).running.contains_key(id)
    }

    /// OS process id of a tracked server.
    pub fn pid(&self, id: &str) -> Option<u32> {
        lock(&self.inner.registry)
            .running
            .get(id)
            .and_then(|record| record.pid)
    }

    /// Best-effort write to a server's stdin after terminal normalization.
    ///
    /// Returns false when the server is not tracked or its stdin is closed.
    pub fn write_input(&self, id: &str, data: &str) -> bool {
        let registry = lock(&self.inner.registry);
        let Some(record) = registry.running.get(id) else {
            return false;
        };
        record.stdin.send(normalize_terminal_input(data)).is_ok()
    }
}

impl Inner {
    /// Boxed so the AOT fallback can start a server from inside an exit watcher.
    fn launch(self: Arc<Self>, request: StartServerRequest) -> BoxFuture<'static, Result<(), ServerError>> {
        Box::pin(async move { self.launch_inner(request).await })
    }

    async fn launch_inner(self: Arc<Self>, request: StartServerRequest) -> Result<(), ServerError> {
        if request.is_incomplete() {
            return Err(ServerError::MissingData);
        }
        let id = request.id.clone();
        let reservation =
            StartReservation::acquire(&self.registry, &id).ok_or(ServerError::AlreadyRunning)?;

        if !is_port_available(request.port) {
            return Err(ServerError::PortInUse);
        }

        let working_dir = std::path::absolute(&request.server_path)?;
        let files = ServerFiles::expected(
            &working_dir,
            self.config.versions_dir.as_deref(),
            request.version_id.as_deref(),
        );
        files.validate(request.aot_cache_enabled()).await?;

        let runtime = self.java.ensure().await?;
        let java = runtime.path.clone().ok_or(JavaRuntimeError::Missing)?;
        let java_home = runtime
            .java_home
            .clone()
            .or_else(|| java.parent().and_then(Path::parent).map(Path::to_path_buf));

        tokio::fs::create_dir_all(&working_dir).await?;
        for dir in launch::profile_dirs(&working_dir) {
            tokio::fs::create_dir_all(&dir).await?;
        }

        let auth = AuthFileLocator::locate(&working_dir).await;
        if let Some(parent) = auth.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                debug!(path = %parent.display(), error = %e, "Failed to create auth directory");
            }
        }
        if !auth.exists {
            AuthFileLocator::remove_invalid(&auth.candidates).await;
        }

        let args = build_args(&request, &working_dir, &files);
        debug!(id = %id, java = %java.display(), args = ?args, "Spawning server");

        let mut command = Command::new(&java);
        command
            .args(&args)
            .current_dir(&working_dir)
            .env("HOME", &working_dir)
            .env("USERPROFILE", &working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(home) = &java_home {
            command.env("JAVA_HOME", home);
        }

        let mut child = command.spawn().map_err(ServerError::Spawn)?;
        let pid = child.id();
        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);

        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        if let Some(stdin) = child.stdin.take() {
            tokio::spawn(write_stdin(id.clone(), stdin, stdin_rx));
        }

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_chunk_reader(stdout, OutputStream::Stdout, chunk_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_chunk_reader(stderr, OutputStream::Stderr, chunk_tx.clone());
        }
        drop(chunk_tx);

        let window: WindowSlot = Arc::default();
        let tail = Arc::new(Mutex::new(StderrTail::new(self.config.stderr_tail_chars)));
        let pump = OutputPump {
            id: id.clone(),
            working_dir: working_dir.clone(),
            emitter: Arc::clone(&self.emitter),
            scanner: OutputAuthScanner::new(Arc::clone(&self.config.markers), !auth.exists),
            windows: self.windows.clone(),
            window: Arc::clone(&window),
            stdin: stdin_tx.clone(),
            tail: Arc::clone(&tail),
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = watch::channel(false);
        reservation.commit(ServerProcessRecord {
            instance,
            pid,
            working_dir,
            auth,
            stdin: stdin_tx,
            stop_tx: Some(stop_tx),
            exited: exited_rx,
            auth_window: Arc::clone(&window),
            status_since: now_ms(),
        });

        info!(
            id = %id,
            pid = ?pid,
            aot_cache = request.aot_cache_enabled(),
            fallback = request.aot_fallback_attempted,
            "Server process started"
        );
        self.emitter.emit(AppEvent::server_running(&id));

        let pump = tokio::spawn(pump.run(chunk_rx));
        tokio::spawn(Arc::clone(&self).watch_exit(ExitWatch {
            instance,
            request,
            child,
            stop_rx,
            exited_tx,
            pump,
            tail,
        }));
        Ok(())
    }

    async fn watch_exit(self: Arc<Self>, mut exit: ExitWatch) {
        let exited = tokio::select! {
            status = exit.child.wait() => Some(status),
            Ok(()) = &mut exit.stop_rx => None,
        };
        let (status, stop_requested) = match exited {
            Some(status) => (status, false),
            None => {
                info!(id = %exit.request.id, "Stopping server");
                (shutdown_child(&mut exit.child, self.config.grace_period).await, true)
            }
        };

        if tokio::time::timeout(self.config.output_drain_timeout, &mut exit.pump)
            .await
            .is_err()
        {
            debug!(id = %exit.request.id, "Output still open after exit, detaching pump");
            exit.pump.abort();
        }
        let tail = exit
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_str()
            .to_string();

        self.handle_exit(&exit, status, stop_requested, &tail).await;
        let _ = exit.exited_tx.send(true);
    }

    async fn handle_exit(
        self: &Arc<Self>,
        exit: &ExitWatch,
        status: io::Result<ExitStatus>,
        stop_requested: bool,
        tail: &str,
    ) {
        let id = exit.request.id.as_str();
        // A stop that lands after the exit but before this point still counts.
        let stop_requested = self.release(id, exit.instance) || stop_requested;

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to reap server process");
                self.emitter
                    .emit(AppEvent::server_stopped(id, Some(e.to_string())));
                return;
            }
        };

        let request = &exit.request;
        let aot_rejected = !stop_requested
            && request.aot_cache_enabled()
            && !request.aot_fallback_attempted
            && tail.to_lowercase().contains("aotcache");
        if aot_rejected {
            warn!(id = %id, status = %status, "AOT cache rejected, restarting without it");
            match Arc::clone(self).launch(request.aot_fallback()).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(id = %id, error = %e, "AOT fallback restart failed");
                    self.emitter
                        .emit(AppEvent::server_stopped(id, Some(e.to_string())));
                    return;
                }
            }
        }

        let error = if stop_requested {
            None
        } else {
            exit_message(status, tail)
        };
        info!(id = %id, status = %status, stop_requested, "Server process exited");
        self.emitter.emit(AppEvent::server_stopped(id, error));
    }

    /// Drop the record (if it is still this instance's) and close its window.
    ///
    /// Returns true when a `stop()` had already claimed the record.
    fn release(&self, id: &str, instance: u64) -> bool {
        let removed = {
            let mut registry = lock(&self.registry);
            let current = registry
                .running
                .get(id)
                .is_some_and(|record| record.instance == instance);
            if current { registry.running.remove(id) } else { None }
        };
        let Some(record) = removed else {
            return false;
        };
        debug!(
            id = %id,
            dir = %record.working_dir.display(),
            auth_file = %record.auth.path.display(),
            had_credentials = record.auth.exists,
            "Released server record"
        );
        let handle = record
            .auth_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.windows.close(&handle);
        }
        record.stop_tx.is_none()
    }
}

async fn write_stdin(id: String, mut stdin: ChildStdin, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(data) = rx.recv().await {
        let result = async {
            stdin.write_all(data.as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        if let Err(e) = result {
            debug!(id = %id, error = %e, "stdin writer exiting");
            break;
        }
    }
}
