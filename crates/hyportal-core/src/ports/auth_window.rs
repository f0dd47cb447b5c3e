//! Browser window capability provided by the host shell.
//!
//! The runtime never renders anything itself. It asks the host to open an
//! isolated window on a URL and reacts to the navigation callbacks the host
//! reports through `AuthWindowListener`.

use std::sync::Arc;
use thiserror::Error;

/// Opaque identifier the host assigns to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// How the window should look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthWindowOptions {
    pub url: String,
    pub title: String,
    /// Block interaction with the main window while open.
    pub modal: bool,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl AuthWindowOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: "Hytale login".to_string(),
            modal: false,
            width: 460,
            height: 720,
            resizable: false,
        }
    }

    #[must_use]
    pub const fn modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }
}

/// Answer to a navigation or new-window request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Deny,
}

/// Callbacks the host invokes for a window it opened.
pub trait AuthWindowListener: Send + Sync {
    /// An in-window navigation is about to happen (redirect, link, in-page).
    fn on_navigation(&self, url: &str, main_frame: bool) -> NavigationDecision;

    /// The page asked to open a new window.
    fn on_new_window(&self, url: &str) -> NavigationDecision;

    /// The window was destroyed, by the user or by `close`.
    fn on_closed(&self);
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window host unavailable: {0}")]
    Unavailable(String),
}

/// Window capability of the host UI shell.
pub trait AuthWindowHost: Send + Sync {
    /// Open a window navigated to `options.url`.
    fn open(
        &self,
        options: &AuthWindowOptions,
        listener: Arc<dyn AuthWindowListener>,
    ) -> Result<WindowId, WindowError>;

    /// Load `url` in an open window. No-op if the window is gone.
    fn navigate(&self, window: WindowId, url: &str);

    /// Close a window. No-op if the window is gone.
    fn close(&self, window: WindowId);
}
