//! Shared fixtures for runtime integration tests.
//!
//! Fake `java` and downloader binaries are small shell scripts, so these
//! helpers are unix-only.
#![cfg(unix)]
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hyportal_core::{
    AppEvent, AuthWindowHost, AuthWindowListener, AuthWindowOptions, ChannelEmitter, ServerStatus,
    StartServerRequest, WindowError, WindowId,
};
use hyportal_runtime::{
    AuthWindowController, JavaResolverConfig, JavaRuntimeResolver, MIN_JAVA_MAJOR,
    ServerSupervisor, SupervisorConfig,
};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

/// Answers `-version` like a current JDK; everything else runs `body`.
pub const JAVA_VERSION_PREAMBLE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo 'openjdk version "25.0.1" 2025-10-21' >&2
  exit 0
fi
"#;

pub fn write_script(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// A host without windows, for servers that never ask for device auth.
pub struct HeadlessHost;

impl AuthWindowHost for HeadlessHost {
    fn open(
        &self,
        _options: &AuthWindowOptions,
        _listener: Arc<dyn AuthWindowListener>,
    ) -> Result<WindowId, WindowError> {
        Err(WindowError::Unavailable("headless".into()))
    }

    fn navigate(&self, _window: WindowId, _url: &str) {}

    fn close(&self, _window: WindowId) {}
}

/// A port nothing is listening on right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A server directory with a scripted `java`.
pub struct ServerFixture {
    pub temp: TempDir,
    pub server_dir: PathBuf,
    /// Every non-probe invocation appends its arguments here.
    pub args_log: PathBuf,
    pub supervisor: ServerSupervisor,
    pub events: UnboundedReceiver<AppEvent>,
}

impl ServerFixture {
    /// `body` runs after the arguments have been logged.
    pub fn new(body: &str) -> Self {
        Self::with_files(body, true)
    }

    pub fn with_files(body: &str, with_aot: bool) -> Self {
        Self::build(body, with_aot, Arc::new(HeadlessHost))
    }

    pub fn with_host(body: &str, host: Arc<dyn AuthWindowHost>) -> Self {
        Self::build(body, true, host)
    }

    fn build(body: &str, with_aot: bool, host: Arc<dyn AuthWindowHost>) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let server_dir = temp.path().join("server");
        std::fs::create_dir_all(&server_dir).unwrap();
        std::fs::write(server_dir.join("HytaleServer.jar"), "jar").unwrap();
        std::fs::write(server_dir.join("Assets.zip"), "assets").unwrap();
        if with_aot {
            std::fs::write(server_dir.join("HytaleServer.aot"), "aot").unwrap();
        }

        let args_log = temp.path().join("args.log");
        let java = temp.path().join("jdk/bin/java");
        write_script(
            &java,
            &format!(
                "{JAVA_VERSION_PREAMBLE}echo \"$*\" >> '{}'\n{body}",
                args_log.display()
            ),
        );

        let resolver = JavaRuntimeResolver::new(JavaResolverConfig {
            override_path: Some(java),
            ..JavaResolverConfig::empty(MIN_JAVA_MAJOR)
        });
        let (emitter, events) = ChannelEmitter::new();
        let supervisor = ServerSupervisor::new(
            Arc::new(resolver),
            AuthWindowController::new(host),
            Arc::new(emitter),
            SupervisorConfig {
                grace_period: Duration::from_millis(300),
                ..SupervisorConfig::default()
            },
        );

        Self {
            temp,
            server_dir,
            args_log,
            supervisor,
            events,
        }
    }

    pub fn request(&self, id: &str) -> StartServerRequest {
        StartServerRequest::new(id, &self.server_dir, free_port(), 2)
    }

    /// Logged argument lines, one per spawn.
    pub fn spawns(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Next status event, skipping output.
    pub async fn next_status(&mut self) -> (ServerStatus, Option<String>) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), self.events.recv())
                .await
                .expect("timed out waiting for a status event")
                .expect("event channel closed");
            if let AppEvent::ServerStatus { status, error, .. } = event {
                return (status, error);
            }
        }
    }
}

/// Poll `path` until `predicate` holds for its contents.
pub async fn wait_for_file(path: &Path, predicate: impl Fn(&str) -> bool) -> String {
    for _ in 0..200 {
        if let Ok(contents) = std::fs::read_to_string(path) {
            if predicate(&contents) {
                return contents;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("{} never reached the expected state", path.display());
}
