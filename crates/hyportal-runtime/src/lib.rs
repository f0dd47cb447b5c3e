//! Process supervision and device-auth orchestration for HyPortal.
//!
//! # Structure
//!
//! - `java` - Locate and validate a Java runtime
//! - `process` - Port probing, output readers, graceful termination
//! - `auth` - Credential files, auth windows, output-driven auth state machine
//! - `supervisor` - Game server process lifecycle
//! - `downloader` - External downloader binary: runs, install, versions

mod archive;
pub mod auth;
pub mod downloader;
pub mod java;
pub mod process;
pub mod supervisor;
pub mod text;

pub use auth::{
    AuthAction, AuthFileLocation, AuthFileLocator, AuthMarkers, AuthWindowController,
    AuthWindowHandle, HytaleMarkers, OutputAuthScanner,
};
pub use downloader::{
    DownloaderConfig, DownloaderError, DownloaderInstaller, DownloaderOutput, DownloaderRunner,
    DownloaderStatus, VersionService, parse_progress,
};
pub use java::{JavaResolverConfig, JavaRuntimeResolver, MIN_JAVA_MAJOR};
pub use process::is_port_available;
pub use supervisor::{ServerSupervisor, SupervisorConfig};
