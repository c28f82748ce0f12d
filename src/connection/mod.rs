pub mod config;

pub use config::ConnectionConfig;

use crate::core::{DbError, Result, User};
use crate::storage::UserTable;
use crate::store::UserStore;
use crate::transaction::{Change, Transaction, TransactionId};
use std::sync::Arc;
use uuid::Uuid;

/// Store connection handle
///
/// Each statement method performs exactly one operation against the user
/// table. Outside a transaction a statement auto-commits; inside one it is
/// buffered, and reads on this handle see the pending overlay.
pub struct Connection {
    /// Unique connection ID
    id: u64,

    /// Shared store instance
    store: Arc<UserStore>,

    /// Connection state
    state: ConnectionState,

    /// Active transaction (if any)
    txn: Option<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Active,
    InTransaction,
    Closed,
}

impl Connection {
    /// Create a new connection (internal use, via [`UserStore::connect`])
    pub(crate) fn new(id: u64, store: Arc<UserStore>) -> Self {
        Self {
            id,
            store,
            state: ConnectionState::Active,
            txn: None,
        }
    }

    /// Get connection ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check if connection is active
    pub fn is_active(&self) -> bool {
        self.state != ConnectionState::Closed
    }

    /// Check if connection is in a transaction
    pub fn is_in_transaction(&self) -> bool {
        self.state == ConnectionState::InTransaction
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(DbError::ConnectionClosed);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Insert one user row
    pub fn insert(&mut self, user: User) -> Result<u64> {
        self.execute_change(Change::Insert { user })
    }

    /// Update one user's email, returning the number of affected rows
    pub fn update_email(&mut self, id: Uuid, email: &str) -> Result<u64> {
        self.ensure_open()?;

        match self.visible_table()?.get(&id) {
            Some(existing) => {
                let mut user = existing.clone();
                user.email = email.to_string();
                self.execute_change(Change::Update { user })
            }
            None => Ok(0),
        }
    }

    /// Delete one user row
    pub fn delete(&mut self, id: Uuid) -> Result<u64> {
        self.execute_change(Change::Delete { id })
    }

    /// Fetch all rows in id order
    pub fn fetch_all(&self) -> Result<Vec<User>> {
        self.ensure_open()?;
        Ok(self.visible_table()?.scan())
    }

    /// Fetch one row by id
    pub fn fetch_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.ensure_open()?;
        Ok(self.visible_table()?.get(&id).cloned())
    }

    /// Fetch rows with age strictly greater than the threshold
    pub fn fetch_older_than(&self, age: i64) -> Result<Vec<User>> {
        self.ensure_open()?;
        Ok(self
            .visible_table()?
            .scan()
            .into_iter()
            .filter(|user| user.age > age)
            .collect())
    }

    /// Fetch one page of rows in id order
    pub fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<User>> {
        self.ensure_open()?;
        Ok(self.visible_table()?.page(limit, offset))
    }

    /// Count all rows
    pub fn count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.visible_table()?.len())
    }

    // ------------------------------------------------------------------
    // Transaction control
    // ------------------------------------------------------------------

    /// Begin a new transaction
    pub fn begin(&mut self) -> Result<()> {
        self.ensure_open()?;

        if self.state == ConnectionState::InTransaction {
            return Err(DbError::TransactionActive);
        }

        let txn = Transaction::new(TransactionId::new());
        log::debug!("{} begun on connection {}", txn.id(), self.id);
        self.txn = Some(txn);
        self.state = ConnectionState::InTransaction;

        Ok(())
    }

    /// Commit the current transaction
    ///
    /// The buffered changes are applied atomically; a conflict with changes
    /// committed since the statements ran discards the whole set and counts
    /// as a rollback.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;

        let mut txn = self.txn.take().ok_or(DbError::NoActiveTransaction)?;
        self.state = ConnectionState::Active;

        let txn_id = txn.id();
        txn.commit()?;

        match self.store.apply_committed(txn.into_changes()) {
            Ok(applied) => {
                log::debug!("{} committed ({} changes)", txn_id, applied);
                Ok(())
            }
            Err(e) => {
                self.store.record_rollback();
                log::warn!("{} failed to commit, changes discarded: {}", txn_id, e);
                Err(e)
            }
        }
    }

    /// Rollback the current transaction
    ///
    /// Rollback without an active transaction is a no-op (SQL standard).
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;

        match self.txn.take() {
            Some(mut txn) => {
                txn.rollback()?;
                self.state = ConnectionState::Active;
                self.store.record_rollback();
                log::debug!("{} rolled back", txn.id());
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Close the connection
    ///
    /// Idempotent. A live transaction is rolled back first; the handle is
    /// unusable afterwards.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        if self.txn.is_some() {
            let _ = self.rollback();
        }

        self.state = ConnectionState::Closed;
        self.store.record_close();
        log::info!("connection {} closed", self.id);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Committed snapshot with this connection's pending changes replayed.
    fn visible_table(&self) -> Result<UserTable> {
        let mut table = self.store.snapshot()?;

        if let Some(txn) = &self.txn {
            for change in txn.changes() {
                table.apply(change.clone())?;
            }
        }

        Ok(table)
    }

    fn execute_change(&mut self, change: Change) -> Result<u64> {
        self.ensure_open()?;

        if self.txn.is_some() {
            // Validate against the staged view before buffering, so the
            // statement fails at execution time, not at commit.
            let affected = {
                let mut staged = self.visible_table()?;
                staged.apply(change.clone())?
            };
            log::debug!(
                "{} {} buffered on connection {}",
                change.kind(),
                change.target(),
                self.id
            );
            if let Some(txn) = self.txn.as_mut() {
                txn.record_change(change)?;
            }
            Ok(affected)
        } else {
            self.store.apply_autocommit(change)
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Ensure the handle is closed and any transaction rolled back
        self.close();
    }
}
