//! Version queries, version downloads and the installed inventory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hyportal_core::{
    AppEvent, AppEventEmitter, Channel, InstalledVersion, SettingsStore, VersionInfo,
    VersionMetadata,
};
use tracing::{debug, info, warn};

use super::{DownloaderError, DownloaderRunner};
use crate::archive::extract_zip;
use crate::text::strip_ansi;

/// Sidecar file written into each installed version directory.
pub const VERSION_METADATA_FILE: &str = "hyportal.meta.json";

const PRINT_VERSION: [&str; 2] = ["-print-version", "-skip-update-check"];

/// High-level downloader operations.
pub struct VersionService {
    runner: Arc<DownloaderRunner>,
    settings: SettingsStore,
    emitter: Arc<dyn AppEventEmitter>,
}

impl VersionService {
    pub fn new(
        runner: Arc<DownloaderRunner>,
        settings: SettingsStore,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            runner,
            settings,
            emitter,
        }
    }

    pub fn runner(&self) -> &Arc<DownloaderRunner> {
        &self.runner
    }

    /// Make sure the downloader holds credentials, running it once to
    /// trigger device authorization if it does not.
    pub async fn authenticate(&self) -> Result<bool, DownloaderError> {
        if self.runner.config().has_credentials().await {
            return Ok(true);
        }
        self.runner.run(&PRINT_VERSION).await?;
        let authed = self.runner.config().has_credentials().await;
        info!(credentials = authed, "Downloader authentication finished");
        Ok(authed)
    }

    /// Ask the downloader for the latest version of each channel and cache
    /// the answer in the settings store.
    pub async fn check_versions(
        &self,
        include_pre_release: bool,
    ) -> Result<Vec<VersionInfo>, DownloaderError> {
        let mut channels = vec![Channel::Stable];
        if include_pre_release {
            channels.push(Channel::PreRelease);
        }

        let mut versions = Vec::with_capacity(channels.len());
        for channel in channels {
            let mut args = channel.downloader_args().to_vec();
            args.extend(PRINT_VERSION);
            let output = self.runner.run(&args).await?;
            match last_line(&output.stdout) {
                Some(id) => {
                    debug!(channel = %channel, id = %id, "Downloader reported version");
                    versions.push(VersionInfo { id, channel });
                }
                None => warn!(channel = %channel, "Downloader printed no version"),
            }
        }

        self.settings.save_cached_versions(&versions).await?;
        Ok(versions)
    }

    /// The version list from the last successful check.
    pub async fn cached_versions(&self) -> Vec<VersionInfo> {
        self.settings.cached_versions().await
    }

    /// Download `id` from `channel` into the versions directory, replacing
    /// any previous copy, and return the refreshed inventory.
    pub async fn download_version(
        &self,
        id: &str,
        channel: Channel,
    ) -> Result<Vec<InstalledVersion>, DownloaderError> {
        let id = id.trim();
        if !is_safe_id(id) {
            return Err(DownloaderError::MissingVersionId);
        }

        let config = self.runner.config();
        tokio::fs::create_dir_all(&config.versions_dir).await?;
        tokio::fs::create_dir_all(&config.temp_dir).await?;
        let temp_zip = config
            .temp_dir
            .join(format!("hyportal-{}.zip", uuid::Uuid::new_v4()));

        let zip_arg = temp_zip.to_string_lossy().into_owned();
        let mut args = channel.downloader_args().to_vec();
        args.extend(["-download-path", zip_arg.as_str(), "-skip-update-check"]);

        info!(id = %id, channel = %channel, "Downloading server version");
        let emitter = Arc::clone(&self.emitter);
        let progress_id = id.to_string();
        let run = self
            .runner
            .run_with_progress(&args, move |progress| {
                emitter.emit(AppEvent::VersionProgress {
                    id: progress_id.clone(),
                    percent: progress.percent,
                    loaded: progress.loaded,
                    total: progress.total,
                });
            })
            .await;
        if let Err(e) = run {
            remove_quietly(&temp_zip).await;
            return Err(e);
        }

        let target = config.versions_dir.join(id);
        let installed = install_archive(&temp_zip, &target).await;
        remove_quietly(&temp_zip).await;
        installed?;

        let metadata = VersionMetadata {
            id: id.to_string(),
            channel,
            installed_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(target.join(VERSION_METADATA_FILE), json).await?;
        info!(id = %id, dir = %target.display(), "Server version installed");

        self.list_installed().await
    }

    /// Every version directory with its metadata and size on disk.
    pub async fn list_installed(&self) -> Result<Vec<InstalledVersion>, DownloaderError> {
        list_installed_in(&self.runner.config().versions_dir).await
    }
}

/// The last non-empty stdout line without terminal escapes.
fn last_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(|line| strip_ansi(line).trim().to_string())
        .rfind(|line| !line.is_empty())
}

/// A single path component that cannot escape the versions directory.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

async fn install_archive(archive: &Path, target: &Path) -> Result<(), DownloaderError> {
    match tokio::fs::remove_dir_all(target).await {
        Ok(()) => debug!(dir = %target.display(), "Replaced previous version"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    tokio::fs::create_dir_all(target).await?;
    extract_zip(archive, target).await?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary archive");
        }
    }
}

async fn list_installed_in(
    versions_dir: &Path,
) -> Result<Vec<InstalledVersion>, DownloaderError> {
    let mut entries = match tokio::fs::read_dir(versions_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut installed = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let path = entry.path();
        let id = entry.file_name().to_string_lossy().into_owned();
        let metadata = read_metadata(&path).await;

        let installed_at = match &metadata {
            Some(meta) => meta.installed_at.timestamp_millis(),
            None => modified_ms(&path).await,
        };
        let size_bytes = dir_size(path.clone()).await;

        installed.push(InstalledVersion {
            id,
            channel: metadata.map(|meta| meta.channel).unwrap_or_default(),
            installed_at,
            size_bytes,
            path,
        });
    }
    Ok(installed)
}

async fn read_metadata(dir: &Path) -> Option<VersionMetadata> {
    let raw = tokio::fs::read_to_string(dir.join(VERSION_METADATA_FILE))
        .await
        .ok()?;
    match serde_json::from_str(&raw) {
        Ok(meta) => Some(meta),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Ignoring unreadable version metadata");
            None
        }
    }
}

async fn modified_ms(path: &Path) -> i64 {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map_or(0, |time| DateTime::<Utc>::from(time).timestamp_millis())
}

async fn dir_size(path: PathBuf) -> u64 {
    tokio::task::spawn_blocking(move || dir_size_blocking(&path))
        .await
        .unwrap_or(0)
}

fn dir_size_blocking(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(kind) if kind.is_dir() => dir_size_blocking(&entry.path()),
            Ok(kind) if kind.is_file() => entry.metadata().map_or(0, |meta| meta.len()),
            _ => 0,
        })
        .sum()
}
