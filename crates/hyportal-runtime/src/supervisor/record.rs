//! Live process bookkeeping.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};

use crate::auth::{AuthFileLocation, AuthWindowHandle};

/// Shared slot for the auth window a server's output opened.
pub type WindowSlot = Arc<Mutex<Option<AuthWindowHandle>>>;

/// One running server.
pub struct ServerProcessRecord {
    /// Distinguishes this process from a later one with the same id.
    pub instance: u64,
    pub pid: Option<u32>,
    pub working_dir: PathBuf,
    pub auth: AuthFileLocation,
    pub stdin: mpsc::UnboundedSender<String>,
    /// Taken by the first `stop()`; the exit watcher escalates on receipt.
    pub stop_tx: Option<oneshot::Sender<()>>,
    /// Flips to true after the exit has been fully handled.
    pub exited: watch::Receiver<bool>,
    pub auth_window: WindowSlot,
    pub status_since: u64,
}

/// Tracked ids: fully started, or reserved by an in-progress `start()`.
#[derive(Default)]
pub struct Registry {
    pub running: HashMap<String, ServerProcessRecord>,
    starting: HashSet<String>,
}

impl Registry {
    pub fn is_tracked(&self, id: &str) -> bool {
        self.running.contains_key(id) || self.starting.contains(id)
    }
}

pub type SharedRegistry = Arc<Mutex<Registry>>;

pub fn lock(registry: &SharedRegistry) -> std::sync::MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds an id between the duplicate check and record insertion.
///
/// Dropping it without `commit` releases the id.
pub struct StartReservation {
    registry: SharedRegistry,
    id: String,
    committed: bool,
}

impl StartReservation {
    /// Reserve `id`, or `None` if it is already tracked.
    pub fn acquire(registry: &SharedRegistry, id: &str) -> Option<Self> {
        let mut guard = lock(registry);
        if guard.is_tracked(id) {
            return None;
        }
        guard.starting.insert(id.to_string());
        Some(Self {
            registry: Arc::clone(registry),
            id: id.to_string(),
            committed: false,
        })
    }

    /// Swap the reservation for the live record.
    pub fn commit(mut self, record: ServerProcessRecord) {
        let mut guard = lock(&self.registry);
        guard.starting.remove(&self.id);
        guard.running.insert(self.id.clone(), record);
        self.committed = true;
    }
}

impl Drop for StartReservation {
    fn drop(&mut self) {
        if !self.committed {
            lock(&self.registry).starting.remove(&self.id);
        }
    }
}

/// The last `limit` characters written to stderr.
#[derive(Debug)]
pub struct StderrTail {
    buf: String,
    limit: usize,
}

impl StderrTail {
    pub const fn new(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit,
        }
    }

    pub fn push(&mut self, text: &str) {
        self.buf.push_str(text);
        let excess = self.buf.chars().count().saturating_sub(self.limit);
        if excess > 0 {
            let cut = self
                .buf
                .char_indices()
                .nth(excess)
                .map_or(self.buf.len(), |(i, _)| i);
            self.buf.drain(..cut);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}
