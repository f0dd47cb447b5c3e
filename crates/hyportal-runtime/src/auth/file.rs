//! Locating the server's persisted credentials.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Result of looking for a credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFileLocation {
    /// The first valid candidate, or the first candidate when none is valid.
    pub path: PathBuf,
    pub exists: bool,
    pub candidates: Vec<PathBuf>,
}

/// Known places a server persists `auth.enc`.
pub struct AuthFileLocator;

impl AuthFileLocator {
    /// Candidate paths in priority order.
    pub fn candidates(server_dir: &Path) -> Vec<PathBuf> {
        vec![
            server_dir.join("auth.enc"),
            server_dir.join("auth").join("auth.enc"),
            server_dir.join(".hytale").join("auth.enc"),
        ]
    }

    /// A regular, non-empty file that is not just whitespace.
    ///
    /// Binary (encrypted) content is valid; only text content is checked for
    /// whitespace.
    pub async fn is_valid(path: &Path) -> bool {
        let Ok(meta) = tokio::fs::metadata(path).await else {
            return false;
        };
        if !meta.is_file() || meta.len() == 0 {
            return false;
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => !text.trim().is_empty(),
                Err(_) => true,
            },
            Err(_) => true,
        }
    }

    pub async fn locate(server_dir: &Path) -> AuthFileLocation {
        let candidates = Self::candidates(server_dir);
        for candidate in &candidates {
            if Self::is_valid(candidate).await {
                return AuthFileLocation {
                    path: candidate.clone(),
                    exists: true,
                    candidates,
                };
            }
        }
        AuthFileLocation {
            path: candidates[0].clone(),
            exists: false,
            candidates,
        }
    }

    /// Delete every candidate that exists but fails validation.
    ///
    /// Errors are logged and swallowed.
    pub async fn remove_invalid(candidates: &[PathBuf]) {
        for candidate in candidates {
            if Self::is_valid(candidate).await {
                continue;
            }
            match tokio::fs::remove_file(candidate).await {
                Ok(()) => debug!(path = %candidate.display(), "Removed invalid auth file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(path = %candidate.display(), error = %e, "Failed to remove invalid auth file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nothing_present_points_at_first_candidate() {
        let temp = tempfile::tempdir().unwrap();
        let location = AuthFileLocator::locate(temp.path()).await;
        assert!(!location.exists);
        assert_eq!(location.path, temp.path().join("auth.enc"));
        assert_eq!(location.candidates.len(), 3);
    }

    #[tokio::test]
    async fn skips_empty_and_whitespace_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("auth.enc"), "   \n").unwrap();
        std::fs::create_dir_all(temp.path().join(".hytale")).unwrap();
        std::fs::write(temp.path().join(".hytale").join("auth.enc"), [0x9f, 0x00, 0x13]).unwrap();

        let location = AuthFileLocator::locate(temp.path()).await;
        assert!(location.exists);
        assert_eq!(location.path, temp.path().join(".hytale").join("auth.enc"));
    }

    #[tokio::test]
    async fn directory_is_not_a_credential() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("auth.enc")).unwrap();
        assert!(!AuthFileLocator::is_valid(&temp.path().join("auth.enc")).await);
    }

    #[tokio::test]
    async fn remove_invalid_keeps_valid_files() {
        let temp = tempfile::tempdir().unwrap();
        let candidates = AuthFileLocator::candidates(temp.path());
        std::fs::write(&candidates[0], "").unwrap();
        std::fs::create_dir_all(temp.path().join("auth")).unwrap();
        std::fs::write(&candidates[1], "token").unwrap();

        AuthFileLocator::remove_invalid(&candidates).await;

        assert!(!candidates[0].exists());
        assert!(candidates[1].exists());
    }
}
