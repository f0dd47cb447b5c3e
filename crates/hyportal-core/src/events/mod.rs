//! Canonical event union for everything the runtime reports upward.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag and camelCase fields:
//!
//! ```json
//! { "type": "server_status", "id": "alpha", "status": "running" }
//! ```
//!
//! Adapters route by `event_name()`, which matches the channel names the UI
//! subscribes to.

use serde::{Deserialize, Serialize};

use crate::domain::{OutputStream, ServerStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    // ========== Server Events ==========
    /// A server changed status. `error` carries the diagnostic for abnormal exits.
    ServerStatus {
        id: String,
        status: ServerStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Raw output chunk from a server process.
    ServerOutput {
        id: String,
        stream: OutputStream,
        data: String,
    },

    /// Input written to a server on the user's behalf, for terminal echo.
    ServerAutoInput { id: String, data: String },

    // ========== Downloader Events ==========
    /// The downloader asked the user to visit a verification URL.
    AuthUrl { url: String },

    /// Progress of a version download driven by the downloader binary.
    VersionProgress {
        id: String,
        percent: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        loaded: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },

    /// Progress of the downloader archive itself.
    DownloadProgress { loaded: u64, total: u64 },
}

impl AppEvent {
    pub fn server_running(id: impl Into<String>) -> Self {
        Self::ServerStatus {
            id: id.into(),
            status: ServerStatus::Running,
            error: None,
        }
    }

    pub fn server_stopped(id: impl Into<String>, error: Option<String>) -> Self {
        Self::ServerStatus {
            id: id.into(),
            status: ServerStatus::Stopped,
            error,
        }
    }

    pub fn server_output(
        id: impl Into<String>,
        stream: OutputStream,
        data: impl Into<String>,
    ) -> Self {
        Self::ServerOutput {
            id: id.into(),
            stream,
            data: data.into(),
        }
    }

    pub fn server_auto_input(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::ServerAutoInput {
            id: id.into(),
            data: data.into(),
        }
    }

    /// Get the channel name for this event.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ServerStatus { .. } => "server-status",
            Self::ServerOutput { .. } => "server-output",
            Self::ServerAutoInput { .. } => "server-auto-input",
            Self::AuthUrl { .. } => "auth-url",
            Self::VersionProgress { .. } => "version-progress",
            Self::DownloadProgress { .. } => "download-progress",
        }
    }
}
