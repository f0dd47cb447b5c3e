//! Terminal rendering of runtime events and auth prompts.

pub mod auth_host;
pub mod terminal;

pub use auth_host::PrintUrlHost;
pub use terminal::{TerminalEmitter, format_size};
