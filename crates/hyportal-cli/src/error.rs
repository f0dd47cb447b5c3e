//! CLI error type and exit code mapping.

use hyportal_core::{JavaRuntimeError, PathError, ServerError};
use hyportal_runtime::DownloaderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// A server could not be started or stopped. Carries the stable code.
    #[error("{code}: {message}")]
    Server { code: &'static str, message: String },

    #[error("{0}")]
    Java(String),

    #[error("Downloader error ({code}): {message}")]
    Downloader { code: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Exit codes follow sysexits.h where one fits.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Server { code, .. } if matches!(*code, "MISSING_DATA" | "MISSING_ID") => 64, // EX_USAGE
            Self::Server { .. } => 1,
            Self::Java(_) => 69,          // EX_UNAVAILABLE
            Self::Downloader { .. } => 1,
            Self::Config(_) => 78,        // EX_CONFIG
            Self::Io(_) => 74,            // EX_IOERR
        }
    }
}

impl From<ServerError> for CliError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::JavaRuntime(java) => java.into(),
            other => Self::Server {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<JavaRuntimeError> for CliError {
    fn from(err: JavaRuntimeError) -> Self {
        Self::Java(format!("{} ({})", err, err.code()))
    }
}

impl From<DownloaderError> for CliError {
    fn from(err: DownloaderError) -> Self {
        Self::Downloader {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_codes_survive_conversion() {
        let err = CliError::from(ServerError::PortInUse);
        assert!(err.to_string().starts_with("PORT_IN_USE"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(CliError::from(ServerError::MissingData).exit_code(), 64);
    }

    #[test]
    fn java_errors_are_unwrapped() {
        let err = CliError::from(ServerError::JavaRuntime(JavaRuntimeError::Missing));
        assert!(matches!(err, CliError::Java(_)));
        assert!(err.to_string().contains("MISSING_JAVA_RUNTIME"));
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn downloader_errors_keep_code() {
        let err = CliError::from(DownloaderError::Busy);
        assert_eq!(
            err.to_string(),
            "Downloader error (DOWNLOADER_BUSY): Downloader is already running a command."
        );
    }
}
