use crate::connection::Connection;
use crate::core::Result;
use crate::store::UserStore;
use std::sync::Arc;

/// Scoped connection acquisition
///
/// Opens exactly one handle per invocation, hands it to the operation as its
/// first argument, and guarantees the handle is closed on every exit path.
/// Faults from the operation propagate unchanged after the close.
pub struct ConnectionScope {
    store: Arc<UserStore>,
}

impl ConnectionScope {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    /// Run an operation with a freshly opened connection.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use userdb::{ConnectionScope, UserStore};
    /// # fn main() -> userdb::Result<()> {
    /// let store = Arc::new(UserStore::new());
    /// let scope = ConnectionScope::new(Arc::clone(&store));
    ///
    /// let count = scope.run(|conn| conn.count())?;
    /// assert_eq!(count, 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.open()?;
        let result = op(&mut conn);
        self.close(conn);
        result
    }

    /// Open a handle without running anything; pairs with [`close`](Self::close).
    ///
    /// The [`Pipeline`](crate::policy::Pipeline) uses this to keep one handle
    /// alive across all retry attempts.
    pub fn open(&self) -> Result<Connection> {
        self.store.connect()
    }

    /// Close a handle opened by [`open`](Self::open).
    pub fn close(&self, mut conn: Connection) {
        conn.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbError, User};

    #[test]
    fn test_scope_closes_on_success() {
        let store = Arc::new(UserStore::new());
        let scope = ConnectionScope::new(Arc::clone(&store));

        let inserted = scope
            .run(|conn| conn.insert(User::new("Alice", "alice@example.com", 30)))
            .unwrap();

        assert_eq!(inserted, 1);
        let stats = store.stats();
        assert_eq!(stats.connections_opened, 1);
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.active_connections, 0);
    }

    #[test]
    fn test_scope_closes_on_fault_and_propagates_it() {
        let store = Arc::new(UserStore::new());
        let scope = ConnectionScope::new(Arc::clone(&store));

        let result: Result<()> = scope.run(|_conn| {
            Err(DbError::ExecutionError("simulated store fault".into()))
        });

        match result {
            Err(DbError::ExecutionError(msg)) => assert_eq!(msg, "simulated store fault"),
            other => panic!("expected execution error, got {:?}", other.err()),
        }

        let stats = store.stats();
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.active_connections, 0);
    }
}
