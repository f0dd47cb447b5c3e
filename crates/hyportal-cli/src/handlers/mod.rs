//! Command handlers.
//!
//! Each handler takes the composed [`CliContext`](crate::CliContext), calls
//! into the runtime, and formats the result for the terminal.

pub mod downloader;
pub mod java;
pub mod serve;
pub mod versions;
