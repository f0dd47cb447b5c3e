//! Derived application directories.

use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{bundled_java_relative, data_root, resource_root};

/// All directories the runtime reads or writes, derived from two roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub resource_root: PathBuf,
}

/// Files inside the extracted downloader directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderFiles {
    pub linux: PathBuf,
    pub windows: PathBuf,
    pub quickstart: PathBuf,
}

impl DownloaderFiles {
    /// The binary for the current platform.
    pub fn current_binary(&self) -> &Path {
        if cfg!(windows) { &self.windows } else { &self.linux }
    }
}

impl AppPaths {
    /// Build from explicit roots.
    pub fn new(data_root: impl Into<PathBuf>, resource_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            resource_root: resource_root.into(),
        }
    }

    /// Resolve both roots from the environment and platform defaults.
    pub fn discover() -> Result<Self, PathError> {
        Ok(Self::new(data_root()?, resource_root()?))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_root.join("Data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir().join("settings.json")
    }

    pub fn servers_dir(&self) -> PathBuf {
        self.data_root.join("Servers")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data_root.join("Versions")
    }

    pub fn downloader_dir(&self) -> PathBuf {
        self.data_root.join("Downloader")
    }

    pub fn downloader_zip(&self) -> PathBuf {
        self.downloader_dir().join("hytale-downloader.zip")
    }

    pub fn downloader_extract_dir(&self) -> PathBuf {
        self.downloader_dir().join("hytale-downloader")
    }

    pub fn downloader_files(&self) -> DownloaderFiles {
        let base = self.downloader_extract_dir();
        DownloaderFiles {
            linux: base.join("hytale-downloader-linux-amd64"),
            windows: base.join("hytale-downloader-windows-amd64.exe"),
            quickstart: base.join("QUICKSTART.md"),
        }
    }

    /// Where the downloader may persist its credentials.
    pub fn downloader_credentials(&self) -> Vec<PathBuf> {
        vec![
            self.downloader_dir()
                .join(".hytale-downloader-credentials.json"),
            self.downloader_extract_dir()
                .join(".hytale-downloader-credentials.json"),
        ]
    }

    /// Bundled `java` executable, if this platform has a layout for one.
    pub fn bundled_java(&self) -> Option<PathBuf> {
        bundled_java_relative()
            .ok()
            .map(|rel| self.resource_root.join(rel))
    }

    /// Create the base directories.
    pub async fn ensure_base_dirs(&self) -> Result<(), PathError> {
        for dir in [
            self.data_dir(),
            self.downloader_dir(),
            self.downloader_extract_dir(),
            self.servers_dir(),
            self.versions_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| PathError::CreateFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_layout_from_data_root() {
        let paths = AppPaths::new("/data/HyPortal", "/opt/hyportal/resources");
        assert_eq!(
            paths.settings_file(),
            PathBuf::from("/data/HyPortal/Data/settings.json")
        );
        assert_eq!(paths.versions_dir(), PathBuf::from("/data/HyPortal/Versions"));
        assert_eq!(
            paths.downloader_files().quickstart,
            PathBuf::from("/data/HyPortal/Downloader/hytale-downloader/QUICKSTART.md")
        );
        assert_eq!(paths.downloader_credentials().len(), 2);
    }

    #[tokio::test]
    async fn ensure_base_dirs_creates_everything() {
        let temp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(temp.path(), temp.path().join("res"));
        paths.ensure_base_dirs().await.unwrap();
        assert!(paths.servers_dir().is_dir());
        assert!(paths.downloader_extract_dir().is_dir());
    }
}
