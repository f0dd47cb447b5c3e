//! Settings store subset used by the runtime.
//!
//! The settings file is a JSON document owned by the desktop shell. The
//! runtime reads per-server runtime options and preferences, and persists
//! the last version list fetched from the downloader. Keys it does not know
//! about are carried through untouched.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::VersionInfo;

/// Default heap step (GB) offered for a new server.
pub const DEFAULT_MEMORY_STEP: u32 = 2;

/// Per-server options that feed a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerRuntimeSettings {
    pub memory_step: u32,
    pub disable_sentry: bool,
    pub use_aot_cache: bool,
}

impl Default for ServerRuntimeSettings {
    fn default() -> Self {
        Self {
            memory_step: DEFAULT_MEMORY_STEP,
            disable_sentry: false,
            use_aot_cache: true,
        }
    }
}

/// Application-wide preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub suppress_low_ram_warning: bool,
    pub suppress_high_ram_warning: bool,
    pub autostart: bool,
    pub include_pre_release: bool,
    pub welcome_seen: bool,
    pub confirm_on_close: bool,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            suppress_low_ram_warning: false,
            suppress_high_ram_warning: false,
            autostart: true,
            include_pre_release: false,
            welcome_seen: false,
            confirm_on_close: true,
            language: "auto".to_string(),
        }
    }
}

impl Preferences {
    /// Trim the language tag, falling back to `auto` when blank.
    pub fn normalize(&mut self) {
        let trimmed = self.language.trim();
        self.language = if trimmed.is_empty() {
            "auto".to_string()
        } else {
            trimmed.to_string()
        };
    }
}

/// Full settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsFile {
    pub servers: BTreeMap<String, ServerRuntimeSettings>,
    pub preferences: Preferences,
    pub cached_versions: Vec<VersionInfo>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Settings store errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON-file backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. Missing or malformed files yield defaults.
    pub async fn load(&self) -> SettingsFile {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Settings file not readable, using defaults");
                return SettingsFile::default();
            }
        };
        match serde_json::from_str::<SettingsFile>(&raw) {
            Ok(mut file) => {
                file.preferences.normalize();
                file
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file malformed, using defaults");
                SettingsFile::default()
            }
        }
    }

    /// Write the whole document.
    pub async fn save(&self, file: &SettingsFile) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SettingsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let body = serde_json::to_string_pretty(file)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| SettingsError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Runtime options for one server, defaults filled in.
    pub async fn runtime_settings(&self, server_id: &str) -> ServerRuntimeSettings {
        self.load()
            .await
            .servers
            .get(server_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Last version list fetched from the downloader.
    pub async fn cached_versions(&self) -> Vec<VersionInfo> {
        dedup_versions(self.load().await.cached_versions)
    }

    /// Replace the cached version list, dropping duplicate ids.
    pub async fn save_cached_versions(&self, versions: &[VersionInfo]) -> Result<(), SettingsError> {
        let mut file = self.load().await;
        file.cached_versions = dedup_versions(versions.to_vec());
        self.save(&file).await
    }
}

fn dedup_versions(versions: Vec<VersionInfo>) -> Vec<VersionInfo> {
    let mut seen = HashSet::new();
    versions
        .into_iter()
        .filter(|v| seen.insert(v.id.clone()))
        .collect()
}
