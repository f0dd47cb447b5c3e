//! Launch preparation: required files, profile directories, argument vector.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use hyportal_core::{ServerError, StartServerRequest};

pub const SERVER_JAR: &str = "HytaleServer.jar";
pub const AOT_CACHE: &str = "HytaleServer.aot";
pub const ASSETS_ARCHIVE: &str = "Assets.zip";

/// On-disk artifacts a server needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFiles {
    pub jar: PathBuf,
    pub assets: PathBuf,
    pub aot: PathBuf,
}

impl ServerFiles {
    /// Where the artifacts are expected. Assets live in the installed
    /// version directory when a version is given.
    pub fn expected(
        server_dir: &Path,
        versions_dir: Option<&Path>,
        version_id: Option<&str>,
    ) -> Self {
        let assets = match (versions_dir, version_id.filter(|v| !v.is_empty())) {
            (Some(versions), Some(version)) => versions.join(version).join(ASSETS_ARCHIVE),
            _ => server_dir.join(ASSETS_ARCHIVE),
        };
        Self {
            jar: server_dir.join(SERVER_JAR),
            assets,
            aot: server_dir.join(AOT_CACHE),
        }
    }

    /// Fail with the first missing artifact, in jar, assets, AOT order.
    pub async fn validate(&self, require_aot: bool) -> Result<(), ServerError> {
        if !exists(&self.jar).await {
            return Err(ServerError::MissingJar);
        }
        if !exists(&self.assets).await {
            return Err(ServerError::MissingAssets);
        }
        if require_aot && !exists(&self.aot).await {
            return Err(ServerError::MissingAot);
        }
        Ok(())
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Profile directories a server expects under its working directory.
pub fn profile_dirs(server_dir: &Path) -> [PathBuf; 2] {
    let app_data = server_dir.join("AppData");
    [app_data.join("Roaming"), app_data.join("Local")]
}

/// JVM and server arguments, in launch order.
pub fn build_args(
    request: &StartServerRequest,
    server_dir: &Path,
    files: &ServerFiles,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(12);
    args.push(prefixed("-Duser.dir=", server_dir));
    args.push(prefixed("-Duser.home=", server_dir));
    if request.aot_cache_enabled() {
        args.push(prefixed("-XX:AOTCache=", &files.aot));
    }
    args.push(format!("-Xmx{}G", request.memory_gb).into());
    args.push("-jar".into());
    args.push(files.jar.clone().into_os_string());
    args.push("--assets".into());
    args.push(files.assets.clone().into_os_string());
    args.push("--bind".into());
    args.push(request.port.to_string().into());
    if request.disable_sentry {
        args.push("--disable-sentry".into());
    }
    args
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

/// Diagnostic for the `stopped` event, or `None` for a clean exit.
pub fn exit_message(status: ExitStatus, stderr_tail: &str) -> Option<String> {
    let mut message = match status.code() {
        Some(0) => return None,
        Some(code) => format!("Process exited with code {code}"),
        None => signal_message(status),
    };
    if !stderr_tail.is_empty() {
        message.push('\n');
        message.push_str(stderr_tail);
    }
    Some(message)
}

#[cfg(unix)]
fn signal_message(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or_else(
        || "Process terminated".to_string(),
        |signal| format!("Process terminated by signal {signal}"),
    )
}

#[cfg(not(unix))]
fn signal_message(_status: ExitStatus) -> String {
    "Process terminated".to_string()
}
