//! Fetching and unpacking the downloader archive.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use hyportal_core::{AppEvent, AppEventEmitter};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DownloaderConfig, DownloaderError, DownloaderStatus};
use crate::archive::extract_zip;

/// Installs the downloader: one archive download at a time.
pub struct DownloaderInstaller {
    config: DownloaderConfig,
    emitter: Arc<dyn AppEventEmitter>,
    client: reqwest::Client,
    active: Mutex<Option<CancellationToken>>,
}

/// Clears the in-progress marker when the download ends.
struct DownloadGuard<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl DownloaderInstaller {
    pub fn new(config: DownloaderConfig, emitter: Arc<dyn AppEventEmitter>) -> Self {
        Self {
            config,
            emitter,
            client: reqwest::Client::new(),
            active: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Report installation state, finishing a pending extraction if an
    /// archive is lying around.
    pub async fn check(&self) -> DownloaderStatus {
        let path = self.config.archive_path.clone();
        if self.config.is_extracted().await {
            return DownloaderStatus {
                ready: true,
                exists: true,
                credentials: self.config.has_credentials().await,
                path,
            };
        }

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return DownloaderStatus {
                ready: false,
                exists: false,
                credentials: false,
                path,
            };
        }

        match self.unpack().await {
            Ok(()) => {
                let ready = self.config.is_extracted().await;
                let credentials = ready && self.config.has_credentials().await;
                DownloaderStatus {
                    ready,
                    exists: true,
                    credentials,
                    path,
                }
            }
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "Failed to unpack downloader archive");
                DownloaderStatus {
                    ready: false,
                    exists: true,
                    credentials: false,
                    path,
                }
            }
        }
    }

    /// Download and unpack the downloader, emitting `download-progress`.
    ///
    /// Returns the extract directory.
    pub async fn download(&self) -> Result<PathBuf, DownloaderError> {
        let cancel = CancellationToken::new();
        let _guard = {
            let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(DownloaderError::Busy);
            }
            *slot = Some(cancel.clone());
            DownloadGuard { slot: &self.active }
        };

        tokio::fs::create_dir_all(&self.config.working_dir).await?;
        info!(url = %self.config.download_url, "Downloading downloader archive");
        let archive = &self.config.archive_path;
        if let Err(e) = self.download_file(archive, &cancel).await {
            if let Err(rm) = tokio::fs::remove_file(archive).await {
                debug!(path = %archive.display(), error = %rm, "No partial archive to remove");
            }
            return Err(e);
        }

        self.unpack().await?;
        info!(dir = %self.config.working_dir.display(), "Downloader installed");
        Ok(self.config.working_dir.clone())
    }

    /// Abort an in-progress download. Returns whether one was running.
    pub fn cancel_download(&self) -> bool {
        let token = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        token.is_some_and(|token| {
            token.cancel();
            true
        })
    }

    async fn unpack(&self) -> Result<(), DownloaderError> {
        tokio::fs::create_dir_all(&self.config.working_dir).await?;
        extract_zip(&self.config.archive_path, &self.config.working_dir).await?;
        tokio::fs::remove_file(&self.config.archive_path).await?;
        Ok(())
    }

    async fn download_file(&self, dest: &Path, cancel: &CancellationToken) -> Result<(), DownloaderError> {
        let response = self
            .client
            .get(&self.config.download_url)
            .header("User-Agent", "hyportal")
            .send()
            .await?
            .error_for_status()?;

        let total = response.content_length().unwrap_or(0);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut loaded: u64 = 0;
        self.emitter.emit(AppEvent::DownloadProgress { loaded, total });

        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => return Err(DownloaderError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            loaded += chunk.len() as u64;
            self.emitter.emit(AppEvent::DownloadProgress { loaded, total });
        }
        file.flush().await?;

        let total = if total == 0 { loaded } else { total };
        self.emitter.emit(AppEvent::DownloadProgress { loaded, total });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::write_zip;
    use hyportal_core::{ChannelEmitter, NoopEmitter};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn downloader_zip(path: &Path) {
        write_zip(
            path,
            &[
                ("hytale-downloader-linux-amd64", &b"#!/bin/sh\n"[..], 0o755),
                ("hytale-downloader-windows-amd64.exe", &b"MZ"[..], 0o644),
                ("QUICKSTART.md", &b"# Quickstart"[..], 0o644),
            ],
        );
    }

    /// Serve `body` once over plain HTTP and return the URL.
    async fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/hytale-downloader.zip")
    }

    #[tokio::test]
    async fn check_reports_nothing_installed() {
        let temp = tempfile::tempdir().unwrap();
        let installer =
            DownloaderInstaller::new(DownloaderConfig::in_dir(temp.path()), Arc::new(NoopEmitter));
        let status = installer.check().await;
        assert!(!status.ready);
        assert!(!status.exists);
    }

    #[tokio::test]
    async fn check_extracts_leftover_archive() {
        let temp = tempfile::tempdir().unwrap();
        let config = DownloaderConfig::in_dir(temp.path());
        downloader_zip(&config.archive_path);
        let installer = DownloaderInstaller::new(config.clone(), Arc::new(NoopEmitter));

        let status = installer.check().await;
        assert!(status.ready);
        assert!(status.exists);
        assert!(!status.credentials);
        assert!(!config.archive_path.exists());
        assert!(config.files.quickstart.is_file());
    }

    #[tokio::test]
    async fn check_with_corrupt_archive_is_not_ready() {
        let temp = tempfile::tempdir().unwrap();
        let config = DownloaderConfig::in_dir(temp.path());
        std::fs::write(&config.archive_path, b"garbage").unwrap();
        let installer = DownloaderInstaller::new(config, Arc::new(NoopEmitter));

        let status = installer.check().await;
        assert!(!status.ready);
        assert!(status.exists);
    }

    #[tokio::test]
    async fn download_streams_and_extracts() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("source.zip");
        downloader_zip(&source);
        let body = std::fs::read(&source).unwrap();
        let size = body.len() as u64;

        let mut config = DownloaderConfig::in_dir(&temp.path().join("Downloader"));
        config.download_url = serve_once(body).await;
        let (emitter, mut events) = ChannelEmitter::new();
        let installer = DownloaderInstaller::new(config.clone(), Arc::new(emitter));

        let dir = installer.download().await.unwrap();
        assert_eq!(dir, config.working_dir);
        assert!(config.is_extracted().await);
        assert!(!config.archive_path.exists());

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(AppEvent::DownloadProgress {
                loaded: size,
                total: size
            })
        );
        assert!(!installer.cancel_download());
    }
}
