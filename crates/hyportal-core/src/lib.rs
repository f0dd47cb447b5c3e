//! Core domain types and port definitions for HyPortal.
//!
//! This crate owns the vocabulary shared by the runtime and every adapter:
//! the Java runtime descriptor, server start requests, the stable error
//! codes surfaced to the UI, the event union, and the ports (event emitter,
//! auth window host) the runtime depends on. It never spawns processes.

pub mod domain;
pub mod error;
pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    Channel, DownloadProgress, InstalledVersion, JavaRuntimeDescriptor, JavaSource, OutputStream,
    RunningServer, RuntimeUnreadyReason, ServerStatus, StartServerRequest, VersionInfo,
    VersionMetadata,
};
pub use error::{ErrorPayload, JavaRuntimeError, ServerError};
pub use events::AppEvent;
pub use paths::{AppPaths, PathError, data_root, resource_root};
pub use ports::{
    AppEventEmitter, AuthWindowHost, AuthWindowListener, AuthWindowOptions, ChannelEmitter,
    NavigationDecision, NoopEmitter, WindowError, WindowId,
};
pub use settings::{
    DEFAULT_MEMORY_STEP, Preferences, ServerRuntimeSettings, SettingsError, SettingsFile,
    SettingsStore,
};
