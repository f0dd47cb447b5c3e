//! Auth "windows" for a terminal: the URL is printed for the user to open.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hyportal_core::{AuthWindowHost, AuthWindowListener, AuthWindowOptions, WindowError, WindowId};

#[derive(Default)]
pub struct PrintUrlHost {
    next_id: AtomicU64,
    open: Mutex<HashMap<WindowId, Arc<dyn AuthWindowListener>>>,
}

impl PrintUrlHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Windows still considered open.
    pub fn open_count(&self) -> usize {
        self.open.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl AuthWindowHost for PrintUrlHost {
    fn open(
        &self,
        options: &AuthWindowOptions,
        listener: Arc<dyn AuthWindowListener>,
    ) -> Result<WindowId, WindowError> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        eprintln!();
        eprintln!("🔑 {}", options.title);
        eprintln!("   Open this URL in a browser to continue:");
        eprintln!("   {}", options.url);
        eprintln!();
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        Ok(id)
    }

    fn navigate(&self, window: WindowId, url: &str) {
        let known = self
            .open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&window);
        if known {
            eprintln!("   Continue at: {url}");
        }
    }

    fn close(&self, window: WindowId) {
        let listener = self
            .open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&window);
        if let Some(listener) = listener {
            tracing::debug!(window = window.0, "Auth prompt dismissed");
            listener.on_closed();
        }
    }
}
