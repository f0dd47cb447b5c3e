//! Auth windows pinned to the device verification flow.
//!
//! The identity provider sometimes redirects the device-flow window to its
//! account settings page. Those navigations are cancelled and the window
//! reloads the last verification URL instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use hyportal_core::{
    AuthWindowHost, AuthWindowListener, AuthWindowOptions, NavigationDecision, WindowError,
    WindowId,
};
use tracing::debug;

const SETTINGS_PREFIX: &str = "https://accounts.hytale.com/settings";

/// True for account-settings pages the window must not leave the flow for.
pub fn is_settings_redirect(url: &str) -> bool {
    url.to_ascii_lowercase().starts_with(SETTINGS_PREFIX)
}

type OnClosed = Box<dyn FnOnce() + Send + 'static>;

struct WindowSession {
    host: Arc<dyn AuthWindowHost>,
    window: OnceLock<WindowId>,
    initial_url: String,
    last_auth_url: Mutex<String>,
    closed: AtomicBool,
    on_closed: Mutex<Option<OnClosed>>,
}

impl WindowSession {
    fn last_auth_url(&self) -> String {
        self.last_auth_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reload_last(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        if let Some(window) = self.window.get() {
            let target = self.last_auth_url();
            debug!(url = %target, "Pinning auth window to verification page");
            self.host.navigate(*window, &target);
        }
    }

    /// Fire the close callback the first time only.
    fn mark_closed(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let callback = self
            .on_closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl AuthWindowListener for WindowSession {
    fn on_navigation(&self, url: &str, main_frame: bool) -> NavigationDecision {
        if !main_frame || url.is_empty() {
            return NavigationDecision::Allow;
        }
        if is_settings_redirect(url) {
            self.reload_last();
            return NavigationDecision::Deny;
        }
        *self
            .last_auth_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = url.to_string();
        NavigationDecision::Allow
    }

    fn on_new_window(&self, url: &str) -> NavigationDecision {
        if is_settings_redirect(url) {
            self.reload_last();
            return NavigationDecision::Deny;
        }
        NavigationDecision::Allow
    }

    fn on_closed(&self) {
        self.mark_closed();
    }
}

/// An open (or since closed) auth window.
#[derive(Clone)]
pub struct AuthWindowHandle {
    window: WindowId,
    session: Arc<WindowSession>,
}

impl AuthWindowHandle {
    pub const fn window_id(&self) -> WindowId {
        self.window
    }

    pub fn initial_url(&self) -> &str {
        &self.session.initial_url
    }

    /// Last verification URL the window successfully navigated to.
    pub fn last_auth_url(&self) -> String {
        self.session.last_auth_url()
    }

    /// Closed by the user or through the controller.
    pub fn is_closed(&self) -> bool {
        self.session.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AuthWindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthWindowHandle")
            .field("window", &self.window)
            .field("initial_url", &self.session.initial_url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Opens and controls auth windows through the host shell.
#[derive(Clone)]
pub struct AuthWindowController {
    host: Arc<dyn AuthWindowHost>,
}

impl AuthWindowController {
    pub fn new(host: Arc<dyn AuthWindowHost>) -> Self {
        Self { host }
    }

    /// Open an isolated, non-resizable window on `url`.
    ///
    /// `on_closed` runs exactly once, whether the user closes the window or
    /// `close` is called.
    pub fn open(
        &self,
        url: &str,
        modal: bool,
        on_closed: impl FnOnce() + Send + 'static,
    ) -> Result<AuthWindowHandle, WindowError> {
        let session = Arc::new(WindowSession {
            host: Arc::clone(&self.host),
            window: OnceLock::new(),
            initial_url: url.to_string(),
            last_auth_url: Mutex::new(url.to_string()),
            closed: AtomicBool::new(false),
            on_closed: Mutex::new(Some(Box::new(on_closed))),
        });
        let options = AuthWindowOptions::new(url).modal(modal);
        let listener: Arc<dyn AuthWindowListener> = session.clone();
        let window = self.host.open(&options, listener)?;
        let _ = session.window.set(window);
        debug!(window = window.0, modal, "Opened auth window");
        Ok(AuthWindowHandle { window, session })
    }

    /// Close the window. Safe to call repeatedly.
    pub fn close(&self, handle: &AuthWindowHandle) {
        if handle.is_closed() {
            return;
        }
        self.host.close(handle.window);
        handle.session.mark_closed();
    }

    /// Reload the last verification URL (or the initial one).
    pub fn reopen(&self, handle: &AuthWindowHandle) {
        handle.session.reload_last();
    }
}
