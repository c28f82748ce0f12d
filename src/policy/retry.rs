use crate::connection::Connection;
use crate::core::Result;
use std::num::NonZeroU32;
use std::time::Duration;

/// Bounded retry policy
///
/// Fixed attempt count, fixed inter-attempt delay. Every fault is treated as
/// retryable; there is no backoff, no jitter, and no fault-type
/// discrimination. When all attempts fail, the fault from the final attempt
/// is propagated verbatim.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempt count (R >= 1 by construction)
    retries: NonZeroU32,

    /// Delay between attempts
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: NonZeroU32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn retries(&self) -> NonZeroU32 {
        self.retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run the attempt closure until it succeeds or the bound is exhausted.
    ///
    /// The delay suspends only the calling task. A policy with one retry
    /// degenerates to a single attempt with no sleep.
    pub async fn run<T, F>(&self, conn: &mut Connection, mut attempt: F) -> Result<T>
    where
        F: FnMut(&mut Connection) -> Result<T>,
    {
        let total = self.retries.get();

        for i in 1..total {
            match attempt(conn) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    log::warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        i,
                        total,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        attempt(conn).map_err(|e| {
            log::error!("all {} attempts failed: {}", total, e);
            e
        })
    }
}

impl Default for RetryPolicy {
    /// Three attempts, two seconds apart (the classic transient-fault setup)
    fn default() -> Self {
        Self {
            retries: NonZeroU32::new(3).unwrap(),
            delay: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DbError;
    use crate::store::UserStore;
    use std::sync::Arc;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_success_short_circuits() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let policy = RetryPolicy::new(nz(5), Duration::ZERO);

        let mut calls = 0;
        let value = policy
            .run(&mut conn, |_| {
                calls += 1;
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_last_fault_propagates() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let policy = RetryPolicy::new(nz(3), Duration::ZERO);

        let mut calls = 0;
        let result: Result<()> = policy
            .run(&mut conn, |_| {
                calls += 1;
                Err(DbError::ExecutionError(format!("fault on attempt {calls}")))
            })
            .await;

        assert_eq!(calls, 3);
        match result {
            Err(DbError::ExecutionError(msg)) => assert_eq!(msg, "fault on attempt 3"),
            other => panic!("expected execution error, got {:?}", other.err()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_attempts_only() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let policy = RetryPolicy::new(nz(3), Duration::from_secs(5));

        let begun = tokio::time::Instant::now();
        let mut calls = 0;
        let value = policy
            .run(&mut conn, |_| {
                calls += 1;
                if calls < 3 {
                    Err(DbError::ExecutionError("transient".into()))
                } else {
                    Ok(calls)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        // two failures, so exactly two fixed delays
        assert_eq!(begun.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy_never_sleeps() {
        let store = Arc::new(UserStore::new());
        let mut conn = store.connect().unwrap();
        let policy = RetryPolicy::new(nz(1), Duration::from_secs(60));

        let begun = tokio::time::Instant::now();
        let mut calls = 0;
        let result: Result<()> = policy
            .run(&mut conn, |_| {
                calls += 1;
                Err(DbError::ExecutionError("hard fault".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert_eq!(begun.elapsed(), Duration::ZERO);
    }
}
