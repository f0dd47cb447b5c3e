//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the runtime expects from its host: somewhere
//! to send events, and a way to show an isolated browser window. They contain
//! no implementation details.

pub mod auth_window;
pub mod event_emitter;

pub use auth_window::{
    AuthWindowHost, AuthWindowListener, AuthWindowOptions, NavigationDecision, WindowError,
    WindowId,
};
pub use event_emitter::{AppEventEmitter, ChannelEmitter, NoopEmitter};
