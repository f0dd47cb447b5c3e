//! Zip extraction for the downloader archive and game versions.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Extract every entry of `zip_path` under `target_dir`.
///
/// Entries with unsafe paths (absolute, or escaping via `..`) are skipped.
/// Unix permission bits stored in the archive are restored, which keeps the
/// downloader binaries executable.
pub async fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<usize, zip::result::ZipError> {
    let zip_path = zip_path.to_path_buf();
    let target_dir = target_dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_blocking(&zip_path, &target_dir))
        .await
        .map_err(|e| zip::result::ZipError::Io(io::Error::other(e)))?
}

fn extract_blocking(zip_path: &Path, target_dir: &Path) -> Result<usize, zip::result::ZipError> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    fs::create_dir_all(target_dir)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            debug!(name = entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let dest: PathBuf = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, fs::Permissions::from_mode(mode & 0o777))?;
        }
        extracted += 1;
    }
    debug!(archive = %zip_path.display(), files = extracted, "Extracted archive");
    Ok(extracted)
}
