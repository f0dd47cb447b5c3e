//! Java runtime descriptor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a resolved Java executable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JavaSource {
    /// Explicit override (`HYPORTAL_JAVA_PATH`).
    Env,
    /// Derived from `JAVA_HOME` / `JDK_HOME`.
    JavaHome,
    /// Found on `PATH` (or the literal `java` command).
    Path,
    /// The runtime shipped next to the application.
    Bundled,
    /// Nothing qualified.
    None,
}

/// Why a runtime is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeUnreadyReason {
    /// No Java executable could be found or started.
    Missing,
    /// A Java executable was found but its major version is too old.
    Outdated,
    /// A Java executable started but exited with a failure status.
    Error,
}

/// Result of resolving a Java runtime.
///
/// `ready == true` always comes with a `path`, and with a `version_major`
/// that is at least `minimum` whenever the major version is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaRuntimeDescriptor {
    pub ready: bool,
    pub path: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub bundled: bool,
    pub source: JavaSource,
    pub version: Option<String>,
    pub version_major: Option<u32>,
    pub minimum: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RuntimeUnreadyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JavaRuntimeDescriptor {
    /// A usable runtime.
    pub fn ready(
        path: PathBuf,
        java_home: Option<PathBuf>,
        source: JavaSource,
        version: Option<String>,
        version_major: Option<u32>,
        minimum: u32,
    ) -> Self {
        Self {
            ready: true,
            path: Some(path),
            java_home,
            bundled: source == JavaSource::Bundled,
            source,
            version,
            version_major,
            minimum,
            reason: None,
            message: None,
        }
    }

    /// No runtime at all.
    pub fn missing(minimum: u32) -> Self {
        Self {
            ready: false,
            path: None,
            java_home: None,
            bundled: false,
            source: JavaSource::None,
            version: None,
            version_major: None,
            minimum,
            reason: Some(RuntimeUnreadyReason::Missing),
            message: Some(format!(
                "Java {minimum}+ is required. Install a compatible JRE or use the build with the embedded runtime."
            )),
        }
    }

    /// A runtime was found but is older than `minimum`.
    pub fn outdated(
        source: JavaSource,
        version: Option<String>,
        version_major: Option<u32>,
        minimum: u32,
    ) -> Self {
        let message = format!(
            "Java {} detected. Java {minimum}+ is required.",
            version.as_deref().unwrap_or("unknown")
        );
        Self {
            ready: false,
            path: None,
            java_home: None,
            bundled: source == JavaSource::Bundled,
            source,
            version,
            version_major,
            minimum,
            reason: Some(RuntimeUnreadyReason::Outdated),
            message: Some(message),
        }
    }

    /// Candidates started but none completed a `-version` run.
    pub fn failed(source: JavaSource, version: Option<String>, minimum: u32) -> Self {
        Self {
            ready: false,
            path: None,
            java_home: None,
            bundled: source == JavaSource::Bundled,
            source,
            version,
            version_major: None,
            minimum,
            reason: Some(RuntimeUnreadyReason::Error),
            message: Some(format!(
                "A Java runtime was found but failed to start. Java {minimum}+ is required."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_descriptor_serializes_camel_case() {
        let desc = JavaRuntimeDescriptor::ready(
            PathBuf::from("/opt/jdk/bin/java"),
            Some(PathBuf::from("/opt/jdk")),
            JavaSource::JavaHome,
            Some("25.0.1".to_string()),
            Some(25),
            25,
        );
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["ready"], true);
        assert_eq!(json["versionMajor"], 25);
        assert_eq!(json["source"], "java_home");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn outdated_descriptor_carries_message() {
        let desc =
            JavaRuntimeDescriptor::outdated(JavaSource::Path, Some("17.0.2".into()), Some(17), 25);
        assert!(!desc.ready);
        assert_eq!(desc.reason, Some(RuntimeUnreadyReason::Outdated));
        assert!(desc.message.unwrap().contains("Java 17.0.2 detected"));
    }
}
