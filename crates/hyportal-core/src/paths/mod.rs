//! Path utilities for HyPortal data directories.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - OS-specific logic is kept private in `platform`
//! - `AppPaths` is a plain value so tests can point it at a temp dir

mod app;
mod error;
mod platform;

pub use app::{AppPaths, DownloaderFiles};
pub use error::PathError;
pub use platform::{bundled_java_relative, data_root, resource_root};
