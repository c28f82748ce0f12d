use crate::connection::Connection;
use crate::core::Result;

/// Outcome of one transactional attempt
///
/// State transitions per attempt:
/// ```text
/// RUNNING ──return──> Committed
///    │
///    └────fault────> RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Committed,
    RolledBack,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Committed => write!(f, "COMMITTED"),
            AttemptOutcome::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

/// Transactional execution policy
///
/// Runs an operation inside a transaction on an already-open connection:
/// commit on success, rollback-then-propagate on any fault. The operation is
/// expected to perform all its mutations before returning; rollback restores
/// the store via the table's buffered-change guarantee.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transactional;

impl Transactional {
    pub fn new() -> Self {
        Self
    }

    /// Execute one attempt.
    ///
    /// A commit fault is treated like an operation fault: rollback (a no-op
    /// if the commit already discarded the changes) and propagate.
    pub fn run<T, F>(&self, conn: &mut Connection, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        conn.begin()?;

        match op(conn) {
            Ok(value) => match conn.commit() {
                Ok(()) => {
                    log::debug!("attempt finished: {}", AttemptOutcome::Committed);
                    Ok(value)
                }
                Err(e) => {
                    conn.rollback()?;
                    log::warn!("attempt finished: {} ({})", AttemptOutcome::RolledBack, e);
                    Err(e)
                }
            },
            Err(e) => {
                conn.rollback()?;
                log::warn!("attempt finished: {} ({})", AttemptOutcome::RolledBack, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbError, User};
    use crate::store::UserStore;
    use std::sync::Arc;

    #[test]
    fn test_commit_on_success() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let txn = Transactional::new();

        let user = User::new("Alice", "alice@example.com", 30);
        txn.run(&mut conn, |c| c.insert(user)).unwrap();

        assert_eq!(conn.count().unwrap(), 1);
        assert_eq!(store.stats().commits, 1);
        assert_eq!(store.stats().rollbacks, 0);
    }

    #[test]
    fn test_rollback_on_fault() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let txn = Transactional::new();

        let result: Result<()> = txn.run(&mut conn, |c| {
            c.insert(User::new("Alice", "alice@example.com", 30))?;
            Err(DbError::ExecutionError("mid-operation fault".into()))
        });

        assert!(result.is_err());
        // the insert must not have reached the store
        assert_eq!(conn.count().unwrap(), 0);
        assert_eq!(store.stats().commits, 0);
        assert_eq!(store.stats().rollbacks, 1);
    }

    #[test]
    fn test_connection_usable_after_rollback() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let txn = Transactional::new();

        let _: Result<()> =
            txn.run(&mut conn, |_| Err(DbError::ExecutionError("boom".into())));

        assert!(!conn.is_in_transaction());
        txn.run(&mut conn, |c| c.insert(User::new("Bob", "bob@example.com", 25)))
            .unwrap();
        assert_eq!(conn.count().unwrap(), 1);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(AttemptOutcome::Committed.to_string(), "COMMITTED");
        assert_eq!(AttemptOutcome::RolledBack.to_string(), "ROLLED_BACK");
    }
}
