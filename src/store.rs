use crate::connection::Connection;
use crate::core::Result;
use crate::storage::UserTable;
use crate::transaction::Change;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Shared in-process store instance
///
/// Owns the committed user table plus the counters the access policies are
/// observed through. Connections hold an `Arc` to it, so concurrent callers
/// each use their own handle over the same store.
pub struct UserStore {
    /// Committed rows
    table: RwLock<UserTable>,

    /// Next connection ID
    next_conn_id: AtomicU64,

    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable::new()),
            next_conn_id: AtomicU64::new(1),
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
        }
    }

    /// Open a new connection handle to this store.
    ///
    /// Every handle is logged once on open and once on close.
    pub fn connect(self: &Arc<Self>) -> Result<Connection> {
        let id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        self.connections_opened.fetch_add(1, Ordering::SeqCst);
        log::info!("connection {} opened", id);
        Ok(Connection::new(id, Arc::clone(self)))
    }

    /// Clone of the committed table, used as the read snapshot.
    pub(crate) fn snapshot(&self) -> Result<UserTable> {
        Ok(self.table.read()?.clone())
    }

    /// Apply a single statement outside a transaction (auto-commit).
    pub(crate) fn apply_autocommit(&self, change: Change) -> Result<u64> {
        let mut table = self.table.write()?;
        let affected = table.apply(change)?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(affected)
    }

    /// Apply a buffered change set atomically.
    ///
    /// All changes are staged against a copy first; the committed table is
    /// only replaced when every change applies cleanly, so a conflict leaves
    /// the store unchanged.
    pub(crate) fn apply_committed(&self, changes: Vec<Change>) -> Result<usize> {
        let mut table = self.table.write()?;
        let mut staged = table.clone();
        let count = changes.len();
        for change in changes {
            staged.apply(change)?;
        }
        *table = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(count)
    }

    pub(crate) fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_close(&self) {
        self.connections_closed.fetch_add(1, Ordering::SeqCst);
    }

    /// Counter snapshot
    pub fn stats(&self) -> StoreStats {
        let opened = self.connections_opened.load(Ordering::SeqCst);
        let closed = self.connections_closed.load(Ordering::SeqCst);

        StoreStats {
            connections_opened: opened,
            connections_closed: closed,
            active_connections: opened.saturating_sub(closed),
            commits: self.commits.load(Ordering::SeqCst),
            rollbacks: self.rollbacks.load(Ordering::SeqCst),
        }
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store counter snapshot
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub active_connections: u64,
    pub commits: u64,
    pub rollbacks: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store Stats: {} active ({} opened / {} closed), {} commits, {} rollbacks",
            self.active_connections,
            self.connections_opened,
            self.connections_closed,
            self.commits,
            self.rollbacks
        )
    }
}
