//! Platform-specific root resolution.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

const APP_DIR_NAME: &str = "HyPortal";

/// Root directory for application data (settings, servers, versions).
///
/// Resolution order:
/// 1. `HYPORTAL_DATA_DIR` environment variable
/// 2. System local data directory joined with `HyPortal`
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("HYPORTAL_DATA_DIR") {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME))
}

/// Root directory for shipped resources (bundled JRE).
///
/// Resolution order:
/// 1. `HYPORTAL_RESOURCE_DIR` environment variable
/// 2. `resources/` next to the running executable
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("HYPORTAL_RESOURCE_DIR") {
        return Ok(PathBuf::from(path));
    }
    let exe = env::current_exe().map_err(|e| PathError::NoExecutable(e.to_string()))?;
    let dir = exe
        .parent()
        .ok_or_else(|| PathError::NoExecutable(exe.display().to_string()))?;
    Ok(dir.join("resources"))
}

/// Location of the bundled `java` binary relative to the resource root.
pub fn bundled_java_relative() -> Result<PathBuf, PathError> {
    let segments: &[&str] = if cfg!(target_os = "windows") {
        &["jre", "win-x64", "bin", "java.exe"]
    } else if cfg!(target_os = "linux") {
        &["jre", "linux-x64", "bin", "java"]
    } else if cfg!(target_os = "macos") {
        &["jre", "mac-x64", "Contents", "Home", "bin", "java"]
    } else {
        return Err(PathError::UnsupportedPlatform(env::consts::OS));
    };
    Ok(segments.iter().collect())
}
