//! CLI bootstrap, the composition root.
//!
//! Every concrete runtime component is built here: the Java resolver, the
//! server supervisor, the downloader runner/installer and the version
//! service all share one terminal emitter and one auth host.

use std::path::PathBuf;
use std::sync::Arc;

use hyportal_core::{AppEventEmitter, AppPaths, SettingsStore};
use hyportal_runtime::{
    AuthWindowController, DownloaderConfig, DownloaderInstaller, DownloaderRunner,
    JavaResolverConfig, JavaRuntimeResolver, ServerSupervisor, SupervisorConfig, VersionService,
};

use crate::error::CliError;
use crate::presentation::{PrintUrlHost, TerminalEmitter};

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub paths: AppPaths,
}

impl CliConfig {
    /// Platform default locations, with an optional data directory override.
    pub fn with_defaults(data_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let mut paths = AppPaths::discover()?;
        if let Some(data_dir) = data_dir {
            paths.data_root = data_dir;
        }
        Ok(Self { paths })
    }
}

/// Fully composed runtime for command handlers.
pub struct CliContext {
    pub paths: AppPaths,
    pub settings: SettingsStore,
    pub emitter: TerminalEmitter,
    pub java: Arc<JavaRuntimeResolver>,
    pub supervisor: ServerSupervisor,
    pub installer: DownloaderInstaller,
    pub versions: VersionService,
}

impl CliContext {
    pub fn downloader(&self) -> &Arc<DownloaderRunner> {
        self.versions.runner()
    }
}

/// Wire the runtime together and make sure the data directories exist.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let CliConfig { paths } = config;
    paths.ensure_base_dirs().await?;
    tracing::debug!(data = %paths.data_root.display(), "Using data directory");

    let emitter = TerminalEmitter::new();
    let shared: Arc<dyn AppEventEmitter> = Arc::new(emitter.clone());
    let windows = AuthWindowController::new(Arc::new(PrintUrlHost::new()));

    let java = Arc::new(JavaRuntimeResolver::new(JavaResolverConfig::from_env(&paths)));
    let supervisor = ServerSupervisor::new(
        Arc::clone(&java),
        windows.clone(),
        Arc::clone(&shared),
        SupervisorConfig::from_paths(&paths),
    );

    let downloader_config = DownloaderConfig::from_paths(&paths);
    let installer = DownloaderInstaller::new(downloader_config.clone(), Arc::clone(&shared));
    let runner = Arc::new(DownloaderRunner::new(
        downloader_config,
        windows,
        Arc::clone(&shared),
    ));
    let settings = SettingsStore::new(paths.settings_file());
    let versions = VersionService::new(runner, settings.clone(), shared);

    Ok(CliContext {
        paths,
        settings,
        emitter,
        java,
        supervisor,
        installer,
        versions,
    })
}
