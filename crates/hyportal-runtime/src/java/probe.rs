//! Spawning candidate executables to learn their version.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::version::{java_major, parse_java_version};

/// What a `-version` probe learned about a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// The process exited with status 0.
    pub exited_ok: bool,
    pub version: Option<String>,
    pub major: Option<u32>,
}

impl ProbeOutcome {
    /// Usable as-is for a runtime requiring `minimum`.
    pub fn satisfies(&self, minimum: u32) -> bool {
        self.exited_ok && self.major.is_some_and(|major| major >= minimum)
    }

    /// Ran and reported a major version below `minimum`.
    pub fn is_outdated(&self, minimum: u32) -> bool {
        self.major.is_some_and(|major| major < minimum)
    }
}

/// Run `<executable> -version` and parse the combined output.
///
/// Returns `None` when the process could not be started at all.
pub async fn probe_java(executable: &Path) -> Option<ProbeOutcome> {
    let output = Command::new(executable)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            debug!(path = %executable.display(), error = %e, "Java candidate failed to start");
            return None;
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let version = parse_java_version(&text);
    let major = version.as_deref().and_then(java_major);

    debug!(
        path = %executable.display(),
        status = %output.status,
        version = ?version,
        "Probed Java candidate"
    );

    Some(ProbeOutcome {
        exited_ok: output.status.success(),
        version,
        major,
    })
}

#[derive(Debug, Deserialize)]
struct BundledMetadata {
    version: Option<String>,
}

/// Sidecar file describing the bundled runtime, `<jre>/hyportal-jre.json`.
pub fn bundled_metadata_path(executable: &Path) -> Option<PathBuf> {
    executable
        .parent()
        .and_then(Path::parent)
        .map(|home| home.join("hyportal-jre.json"))
}

/// Version recorded for the bundled runtime, if the sidecar is readable.
pub async fn read_bundled_version(executable: &Path) -> Option<String> {
    let meta_path = bundled_metadata_path(executable)?;
    let raw = tokio::fs::read_to_string(&meta_path).await.ok()?;
    match serde_json::from_str::<BundledMetadata>(&raw) {
        Ok(meta) => meta.version.filter(|v| !v.is_empty()),
        Err(e) => {
            debug!(path = %meta_path.display(), error = %e, "Ignoring malformed bundled JRE metadata");
            None
        }
    }
}
