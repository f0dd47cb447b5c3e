//! Error taxonomy surfaced to the UI.
//!
//! Every precondition failure carries a stable string code (`code()`), which
//! is what adapters hand to the UI. Messages are for logs only.

use serde::Serialize;
use thiserror::Error;

/// No Java runtime satisfies the minimum version.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JavaRuntimeError {
    #[error("Java runtime not found.")]
    Missing,

    #[error("Java {minimum} or newer is required.")]
    Outdated { minimum: u32, found: Option<u32> },
}

impl JavaRuntimeError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Missing => "MISSING_JAVA_RUNTIME",
            Self::Outdated { .. } => "OUTDATED_JAVA_RUNTIME",
        }
    }
}

/// Failure starting, stopping or addressing a server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("MISSING_DATA")]
    MissingData,

    #[error("MISSING_ID")]
    MissingId,

    #[error("ALREADY_RUNNING")]
    AlreadyRunning,

    #[error("PORT_IN_USE")]
    PortInUse,

    #[error("MISSING_JAR")]
    MissingJar,

    #[error("MISSING_ASSETS")]
    MissingAssets,

    #[error("MISSING_AOT")]
    MissingAot,

    #[error(transparent)]
    JavaRuntime(#[from] JavaRuntimeError),

    /// The OS refused to start the process.
    #[error("Failed to spawn server process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Stable identifier for the UI.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingData => "MISSING_DATA",
            Self::MissingId => "MISSING_ID",
            Self::AlreadyRunning => "ALREADY_RUNNING",
            Self::PortInUse => "PORT_IN_USE",
            Self::MissingJar => "MISSING_JAR",
            Self::MissingAssets => "MISSING_ASSETS",
            Self::MissingAot => "MISSING_AOT",
            Self::JavaRuntime(e) => e.code(),
            Self::Spawn(_) => "SPAWN_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Wire form for adapters: `{ code, message }`.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Serializable error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
}
