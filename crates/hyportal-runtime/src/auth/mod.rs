//! Device-code authentication orchestration.
//!
//! - `file`: persisted credential discovery in a server directory
//! - `window`: the isolated browser window pinned to the verification flow
//! - `markers`: the exact text the server and downloader print
//! - `scanner`: the output-driven state machine

mod file;
mod markers;
mod scanner;
mod window;

pub use file::{AuthFileLocation, AuthFileLocator};
pub use markers::{AuthMarkers, HytaleMarkers, append_user_code};
pub use scanner::{AuthAction, OutputAuthScanner};
pub use window::{AuthWindowController, AuthWindowHandle, is_settings_redirect};
