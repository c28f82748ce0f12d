//! Concurrent dual-query fetch.
//!
//! Two independent read queries run together under the cooperative
//! scheduler; each opens its own handle, the tasks share no mutable state and
//! both result sets are collected before returning. Completion order is not
//! surfaced, and there is no cancellation or timeout beyond the queries
//! themselves.

use crate::core::{Result, User};
use crate::policy::ConnectionScope;
use crate::store::UserStore;
use std::sync::Arc;

/// Age threshold used by the dual-fetch demo
pub const DEFAULT_AGE_THRESHOLD: i64 = 40;

/// Fetch all users on a dedicated handle.
pub async fn fetch_all_users(store: &Arc<UserStore>) -> Result<Vec<User>> {
    tokio::task::yield_now().await;

    let scope = ConnectionScope::new(Arc::clone(store));
    let rows = scope.run(|conn| conn.fetch_all())?;
    log::info!("fetched all users: {} rows", rows.len());
    Ok(rows)
}

/// Fetch users older than `age` on a dedicated handle.
pub async fn fetch_users_older_than(store: &Arc<UserStore>, age: i64) -> Result<Vec<User>> {
    tokio::task::yield_now().await;

    let scope = ConnectionScope::new(Arc::clone(store));
    let rows = scope.run(|conn| conn.fetch_older_than(age))?;
    log::info!("fetched users age > {}: {} rows", age, rows.len());
    Ok(rows)
}

/// Run both queries concurrently and collect both result sets.
pub async fn fetch_concurrently(
    store: &Arc<UserStore>,
    age: i64,
) -> Result<(Vec<User>, Vec<User>)> {
    futures::try_join!(fetch_all_users(store), fetch_users_older_than(store, age))
}
