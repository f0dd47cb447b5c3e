//! Server start requests and lifecycle vocabulary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current time as Unix milliseconds.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Server lifecycle status as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// The process has been spawned.
    Running,
    /// The process has exited or was stopped.
    Stopped,
}

/// Which pipe a chunk of output arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// A tracked server, as reported to a (re)connecting UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningServer {
    pub id: String,
    /// Unix milliseconds when the server entered its current status.
    pub status_since: u64,
}

/// Everything needed to launch one server process.
///
/// `use_aot_cache` is tri-state: only an explicit `Some(false)` disables the
/// AOT cache, matching how the UI omits the field for the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartServerRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "path")]
    pub server_path: PathBuf,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub memory_gb: u32,
    #[serde(default)]
    pub disable_sentry: bool,
    #[serde(default)]
    pub use_aot_cache: Option<bool>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub aot_fallback_attempted: bool,
}

impl StartServerRequest {
    /// Create a request with the required fields.
    pub fn new(
        id: impl Into<String>,
        server_path: impl Into<PathBuf>,
        port: u16,
        memory_gb: u32,
    ) -> Self {
        Self {
            id: id.into(),
            server_path: server_path.into(),
            port,
            memory_gb,
            disable_sentry: false,
            use_aot_cache: None,
            version_id: None,
            aot_fallback_attempted: false,
        }
    }

    #[must_use]
    pub const fn with_disable_sentry(mut self, disable: bool) -> Self {
        self.disable_sentry = disable;
        self
    }

    #[must_use]
    pub const fn with_aot_cache(mut self, enabled: bool) -> Self {
        self.use_aot_cache = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Whether the AOT cache flag will be passed to the runtime.
    pub const fn aot_cache_enabled(&self) -> bool {
        !matches!(self.use_aot_cache, Some(false))
    }

    /// True when any required field is absent or zero.
    pub fn is_incomplete(&self) -> bool {
        self.id.is_empty()
            || self.server_path.as_os_str().is_empty()
            || self.port == 0
            || self.memory_gb == 0
    }

    /// The same request with the AOT cache disabled and the fallback marked as used.
    #[must_use]
    pub fn aot_fallback(&self) -> Self {
        Self {
            use_aot_cache: Some(false),
            aot_fallback_attempted: true,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_tracks_wall_clock() {
        let before = chrono::Utc::now().timestamp_millis();
        let now = i64::try_from(now_ms()).unwrap();
        assert!(now >= before);
        assert!(now - before < 5_000);
    }

    #[test]
    fn aot_cache_defaults_to_enabled() {
        let req = StartServerRequest::new("a", "/srv/a", 5520, 4);
        assert!(req.aot_cache_enabled());
        assert!(!req.clone().with_aot_cache(false).aot_cache_enabled());
        assert!(req.with_aot_cache(true).aot_cache_enabled());
    }

    #[test]
    fn incomplete_when_port_or_memory_zero() {
        assert!(StartServerRequest::new("a", "/srv/a", 0, 4).is_incomplete());
        assert!(StartServerRequest::new("a", "/srv/a", 5520, 0).is_incomplete());
        assert!(StartServerRequest::new("", "/srv/a", 5520, 4).is_incomplete());
        assert!(!StartServerRequest::new("a", "/srv/a", 5520, 4).is_incomplete());
    }

    #[test]
    fn aot_fallback_keeps_other_parameters() {
        let req = StartServerRequest::new("a", "/srv/a", 5520, 6)
            .with_disable_sentry(true)
            .with_version_id("2026.01");
        let retry = req.aot_fallback();
        assert_eq!(retry.use_aot_cache, Some(false));
        assert!(retry.aot_fallback_attempted);
        assert_eq!(retry.port, 5520);
        assert_eq!(retry.memory_gb, 6);
        assert!(retry.disable_sentry);
        assert_eq!(retry.version_id.as_deref(), Some("2026.01"));
    }

    #[test]
    fn deserializes_ui_payload() {
        let req: StartServerRequest = serde_json::from_str(
            r#"{"id":"s1","path":"/srv/s1","port":5520,"memoryGb":4,"useAotCache":false}"#,
        )
        .unwrap();
        assert_eq!(req.server_path, PathBuf::from("/srv/s1"));
        assert!(!req.aot_cache_enabled());
        assert!(!req.aot_fallback_attempted);
    }
}
