//! Domain types shared across the runtime and adapters.

mod java;
mod server;
mod version;

pub use java::{JavaRuntimeDescriptor, JavaSource, RuntimeUnreadyReason};
pub use server::{OutputStream, RunningServer, ServerStatus, StartServerRequest, now_ms};
pub use version::{Channel, DownloadProgress, InstalledVersion, VersionInfo, VersionMetadata};
