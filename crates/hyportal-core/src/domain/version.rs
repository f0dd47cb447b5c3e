//! Game versions fetched through the downloader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Release channel ("patchline") of a version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    #[default]
    Stable,
    PreRelease,
}

impl Channel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::PreRelease => "pre-release",
        }
    }

    /// Extra downloader arguments selecting this channel.
    pub const fn downloader_args(self) -> &'static [&'static str] {
        match self {
            Self::Stable => &[],
            Self::PreRelease => &["-patchline", "pre-release"],
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Self::Stable),
            "pre-release" => Ok(Self::PreRelease),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// A version advertised by the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    pub channel: Channel,
}

/// Sidecar metadata written next to an extracted version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    pub id: String,
    pub channel: Channel,
    pub installed_at: DateTime<Utc>,
}

/// A version present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledVersion {
    pub id: String,
    pub path: PathBuf,
    pub channel: Channel,
    /// Unix milliseconds.
    pub installed_at: i64,
    pub size_bytes: u64,
}

/// Progress parsed from downloader output, sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f64,
    pub loaded: Option<u64>,
    pub total: Option<u64>,
}
