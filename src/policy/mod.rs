// ============================================================================
// Access Policy Module
// ============================================================================
//
// Explicit policy objects replacing ad-hoc wrapper stacking:
// - ConnectionScope: scoped handle acquisition with guaranteed release
// - Transactional:   commit on success, rollback-then-propagate on fault
// - RetryPolicy:     bounded retries with a fixed delay
//
// Pipeline composes the three: scope(open) -> retry { transactional { op } }
// -> scope(close).
//
// ============================================================================

pub mod retry;
pub mod scope;
pub mod transaction;

pub use retry::RetryPolicy;
pub use scope::ConnectionScope;
pub use transaction::{AttemptOutcome, Transactional};

use crate::connection::Connection;
use crate::core::Result;
use crate::store::UserStore;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Composed access pipeline
///
/// One handle is opened for the whole call and closed on the way out
/// regardless of outcome; each attempt runs in its own transaction.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use userdb::{Pipeline, User, UserStore};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> userdb::Result<()> {
/// let store = Arc::new(UserStore::new());
/// let pipeline = Pipeline::new(Arc::clone(&store));
///
/// let inserted = pipeline
///     .execute(|conn| conn.insert(User::new("Alice", "alice@example.com", 30)))
///     .await?;
/// assert_eq!(inserted, 1);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    scope: ConnectionScope,
    txn: Transactional,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {
            scope: ConnectionScope::new(store),
            txn: Transactional::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the whole retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum attempt count
    pub fn retries(mut self, retries: NonZeroU32) -> Self {
        self.retry = RetryPolicy::new(retries, self.retry.delay());
        self
    }

    /// Set the fixed inter-attempt delay
    pub fn delay(mut self, delay: Duration) -> Self {
        self.retry = RetryPolicy::new(self.retry.retries(), delay);
        self
    }

    /// Run an operation through scope, retry and transaction.
    pub async fn execute<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(&mut Connection) -> Result<T>,
    {
        let mut conn = self.scope.open()?;
        let result = self
            .retry
            .run(&mut conn, |c| self.txn.run(c, &mut op))
            .await;
        self.scope.close(conn);
        result
    }
}
