//! The external Hytale downloader.
//!
//! - `runner`: one downloader invocation at a time, with device auth
//! - `progress`: `42.0% (1.2 GB/3.4 GB)` parsing
//! - `install`: fetching and unpacking the downloader itself
//! - `versions`: version queries, downloads and the installed inventory

mod install;
mod progress;
mod runner;
mod versions;

use std::path::{Path, PathBuf};

use hyportal_core::{AppPaths, SettingsError, paths::DownloaderFiles};
use serde::Serialize;
use thiserror::Error;

pub use install::DownloaderInstaller;
pub use progress::parse_progress;
pub use runner::{DownloaderOutput, DownloaderRunner};
pub use versions::{VERSION_METADATA_FILE, VersionService};

/// Where the downloader archive is published.
pub const DOWNLOADER_URL: &str = "https://downloader.hytale.com/hytale-downloader.zip";

const CREDENTIALS_FILE: &str = ".hytale-downloader-credentials.json";

/// Locations used by the downloader components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Binary for the current platform.
    pub binary: PathBuf,
    /// Working directory for downloader runs (the extract directory).
    pub working_dir: PathBuf,
    pub files: DownloaderFiles,
    /// Where the downloaded archive is stored before extraction.
    pub archive_path: PathBuf,
    pub credential_files: Vec<PathBuf>,
    pub download_url: String,
    pub versions_dir: PathBuf,
    /// Scratch space for version archives.
    pub temp_dir: PathBuf,
}

impl DownloaderConfig {
    pub fn from_paths(paths: &AppPaths) -> Self {
        let files = paths.downloader_files();
        Self {
            binary: files.current_binary().to_path_buf(),
            working_dir: paths.downloader_extract_dir(),
            archive_path: paths.downloader_zip(),
            credential_files: paths.downloader_credentials(),
            download_url: DOWNLOADER_URL.to_string(),
            versions_dir: paths.versions_dir(),
            temp_dir: std::env::temp_dir(),
            files,
        }
    }

    /// Rooted in a single directory, for tests and portable installs.
    pub fn in_dir(root: &Path) -> Self {
        let working_dir = root.join("hytale-downloader");
        let files = DownloaderFiles {
            linux: working_dir.join("hytale-downloader-linux-amd64"),
            windows: working_dir.join("hytale-downloader-windows-amd64.exe"),
            quickstart: working_dir.join("QUICKSTART.md"),
        };
        Self {
            binary: files.current_binary().to_path_buf(),
            archive_path: root.join("hytale-downloader.zip"),
            credential_files: vec![root.join(CREDENTIALS_FILE), working_dir.join(CREDENTIALS_FILE)],
            download_url: DOWNLOADER_URL.to_string(),
            versions_dir: root.join("Versions"),
            temp_dir: root.join("tmp"),
            working_dir,
            files,
        }
    }

    /// Whether the downloader has persisted credentials.
    pub async fn has_credentials(&self) -> bool {
        for path in &self.credential_files {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }

    /// Both platform binaries and the quickstart are present.
    pub async fn is_extracted(&self) -> bool {
        for path in [&self.files.linux, &self.files.windows, &self.files.quickstart] {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return false;
            }
        }
        true
    }
}

/// Installation state of the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloaderStatus {
    /// Extracted and runnable.
    pub ready: bool,
    /// The archive or the extracted files exist.
    pub exists: bool,
    pub credentials: bool,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Downloader is already running a command.")]
    Busy,

    #[error("Downloader binary not found at {}", .0.display())]
    BinaryMissing(PathBuf),

    #[error("Failed to start downloader: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("{}", exited_message(*.code, .stderr))]
    Exited { code: Option<i32>, stderr: String },

    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing version identifier")]
    MissingVersionId,

    #[error("Downloader cancelled")]
    Cancelled,

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

fn exited_message(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    code.map_or_else(
        || "Downloader was terminated".to_string(),
        |code| format!("Downloader exited with code {code}"),
    )
}

impl DownloaderError {
    /// Stable identifier for the UI.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Busy => "DOWNLOADER_BUSY",
            Self::BinaryMissing(_) => "MISSING_DOWNLOADER",
            Self::Spawn(_) => "SPAWN_FAILED",
            Self::Exited { .. } => "DOWNLOADER_FAILED",
            Self::Http(_) => "DOWNLOAD_FAILED",
            Self::Archive(_) => "ARCHIVE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::MissingVersionId => "MISSING_ID",
            Self::Cancelled => "CANCELLED",
            Self::Settings(_) => "SETTINGS_ERROR",
        }
    }
}
