//! HyPortal command-line adapter.
//!
//! `main.rs` is the composition root; handlers receive a fully wired
//! [`CliContext`] and only translate between the terminal and the runtime.

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, DownloaderCommand, VersionsCommand};
pub use error::CliError;
pub use parser::Cli;
