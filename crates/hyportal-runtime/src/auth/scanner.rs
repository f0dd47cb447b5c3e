//! Output-driven device-auth state machine.
//!
//! The scanner does no I/O. Callers feed it output text and carry out the
//! `AuthAction`s it returns, reporting the result of an auth file check back
//! through `auth_file_checked`.
//!
//! ```text
//! Idle ──no-tokens marker──▶ (VerifyAuthFile) ──missing──▶ CommandSent
//!   ▲                                │ exists                 │ code / visit URL
//!   └────────────────────────────────┘                        ▼
//!                      Authenticated ◀──success marker── window opened
//! ```

use std::sync::Arc;

use super::markers::{AuthMarkers, append_user_code};
use crate::text::strip_ansi;

/// Longest partial line kept between chunks.
const MAX_PENDING_LINE: usize = 16 * 1024;

/// Side effect requested by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Check whether a valid credential file exists, then call
    /// `auth_file_checked`.
    VerifyAuthFile,
    /// Write to the process's stdin and echo it as auto-input.
    SendInput(String),
    /// Open an auth window on this URL; call `window_closed` if that fails.
    OpenWindow(String),
    /// Close the open auth window.
    CloseWindow,
}

/// Per-process device-auth state.
pub struct OutputAuthScanner {
    markers: Arc<dyn AuthMarkers>,
    needs_device_auth: bool,
    auth_command_sent: bool,
    auth_check_in_flight: bool,
    pending_user_code: Option<String>,
    pending_visit_url: Option<String>,
    window_open: bool,
    partial_line: String,
}

impl OutputAuthScanner {
    /// `needs_device_auth` is false when a valid credential file was found
    /// before launch; the scanner then ignores all output.
    pub fn new(markers: Arc<dyn AuthMarkers>, needs_device_auth: bool) -> Self {
        Self {
            markers,
            needs_device_auth,
            auth_command_sent: false,
            auth_check_in_flight: false,
            pending_user_code: None,
            pending_visit_url: None,
            window_open: false,
            partial_line: String::new(),
        }
    }

    pub const fn needs_device_auth(&self) -> bool {
        self.needs_device_auth
    }

    pub const fn auth_command_sent(&self) -> bool {
        self.auth_command_sent
    }

    pub fn pending_user_code(&self) -> Option<&str> {
        self.pending_user_code.as_deref()
    }

    pub fn pending_visit_url(&self) -> Option<&str> {
        self.pending_visit_url.as_deref()
    }

    /// Feed a chunk of output. Complete lines are scanned; a trailing
    /// partial line waits for the rest of it.
    pub fn feed(&mut self, chunk: &str) -> Vec<AuthAction> {
        self.partial_line.push_str(chunk);
        let mut actions = Vec::new();

        let Some(last_newline) = self.partial_line.rfind('\n') else {
            if self.partial_line.len() > MAX_PENDING_LINE {
                let line = std::mem::take(&mut self.partial_line);
                self.scan_line(&line, &mut actions);
            }
            return actions;
        };

        let rest = self.partial_line.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial_line, rest);
        for line in complete.lines() {
            self.scan_line(line, &mut actions);
        }
        actions
    }

    /// Scan whatever partial line is buffered (process output ended).
    pub fn flush(&mut self) -> Vec<AuthAction> {
        let mut actions = Vec::new();
        let line = std::mem::take(&mut self.partial_line);
        if !line.is_empty() {
            self.scan_line(&line, &mut actions);
        }
        actions
    }

    /// Result of a `VerifyAuthFile` action.
    pub fn auth_file_checked(&mut self, exists: bool) -> Vec<AuthAction> {
        self.auth_check_in_flight = false;
        if exists || self.auth_command_sent {
            self.needs_device_auth = !exists;
            return Vec::new();
        }
        self.auth_command_sent = true;
        vec![AuthAction::SendInput(self.markers.login_command().to_string())]
    }

    /// The auth window went away (user closed it, or opening failed).
    pub const fn window_closed(&mut self) {
        self.window_open = false;
    }

    fn scan_line(&mut self, raw: &str, actions: &mut Vec<AuthAction>) {
        if !self.needs_device_auth {
            return;
        }
        let line = strip_ansi(raw);

        if !self.auth_command_sent
            && !self.auth_check_in_flight
            && self.markers.is_tokens_missing(&line)
        {
            self.auth_check_in_flight = true;
            actions.push(AuthAction::VerifyAuthFile);
        }

        if !self.auth_command_sent {
            return;
        }

        if self.markers.is_auth_success(&line) {
            if self.window_open {
                self.window_open = false;
                actions.push(AuthAction::CloseWindow);
            }
            self.needs_device_auth = false;
            self.pending_user_code = None;
            self.pending_visit_url = None;
            actions.push(AuthAction::SendInput(
                self.markers.persist_command().to_string(),
            ));
            return;
        }

        if let Some(code) = self.markers.user_code(&line) {
            self.pending_user_code = Some(code);
            self.maybe_open_window(actions);
        }

        if let Some(url) = self.markers.verify_url(&line) {
            self.pending_visit_url = Some(url);
            self.maybe_open_window(actions);
        }
    }

    fn maybe_open_window(&mut self, actions: &mut Vec<AuthAction>) {
        if self.window_open {
            return;
        }
        let Some(url) = self.pending_visit_url.as_deref() else {
            return;
        };
        if let Some(target) = append_user_code(url, self.pending_user_code.as_deref()) {
            self.window_open = true;
            actions.push(AuthAction::OpenWindow(target));
        }
    }
}
