//! Memory-conscious read paths over the user table.
//!
//! Each reader is an explicit iterator: batches, single rows, lazily fetched
//! pages and an age stream feeding [`average_age`]. Batch readers keep one
//! connection open for the whole iteration; [`LazyPages`] opens a short-lived
//! scope per page instead.

use crate::connection::Connection;
use crate::core::{DbError, Result, User};
use crate::policy::ConnectionScope;
use crate::store::UserStore;
use std::sync::Arc;

/// Rows in fixed-size batches over one connection
///
/// The connection closes when the iterator is dropped.
pub struct UserBatches {
    conn: Connection,
    batch_size: usize,
    offset: usize,
    done: bool,
}

impl UserBatches {
    pub fn new(store: &Arc<UserStore>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(DbError::ExecutionError(
                "Batch size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            conn: store.connect()?,
            batch_size,
            offset: 0,
            done: false,
        })
    }
}

impl Iterator for UserBatches {
    type Item = Result<Vec<User>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.conn.fetch_page(self.batch_size, self.offset) {
            Ok(rows) if rows.is_empty() => {
                self.done = true;
                None
            }
            Ok(rows) => {
                self.offset += rows.len();
                Some(Ok(rows))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Rows one by one, flattening [`UserBatches`]
pub struct UserStream {
    batches: UserBatches,
    current: std::vec::IntoIter<User>,
}

impl UserStream {
    pub fn new(store: &Arc<UserStore>, batch_size: usize) -> Result<Self> {
        Ok(Self {
            batches: UserBatches::new(store, batch_size)?,
            current: Vec::new().into_iter(),
        })
    }
}

impl Iterator for UserStream {
    type Item = Result<User>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(user) = self.current.next() {
                return Some(Ok(user));
            }

            match self.batches.next()? {
                Ok(batch) => self.current = batch.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Lazy pagination: each page is fetched only when requested, over its own
/// short-lived connection scope.
pub struct LazyPages {
    scope: ConnectionScope,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl LazyPages {
    pub fn new(store: &Arc<UserStore>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(DbError::ExecutionError(
                "Page size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            scope: ConnectionScope::new(Arc::clone(store)),
            page_size,
            offset: 0,
            done: false,
        })
    }
}

impl Iterator for LazyPages {
    type Item = Result<Vec<User>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let page_size = self.page_size;
        let offset = self.offset;
        match self.scope.run(|conn| conn.fetch_page(page_size, offset)) {
            Ok(page) if page.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                self.offset += page.len();
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Ages one by one
pub struct AgeStream {
    inner: UserStream,
}

impl Iterator for AgeStream {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(|user| user.age))
    }
}

pub fn stream_user_ages(store: &Arc<UserStore>, batch_size: usize) -> Result<AgeStream> {
    Ok(AgeStream {
        inner: UserStream::new(store, batch_size)?,
    })
}

/// Average age computed by consuming the age stream.
///
/// Returns 0.0 for an empty table.
pub fn average_age(store: &Arc<UserStore>) -> Result<f64> {
    let mut total = 0i64;
    let mut count = 0u64;

    for age in stream_user_ages(store, 100)? {
        total += age?;
        count += 1;
    }

    if count == 0 {
        Ok(0.0)
    } else {
        Ok(total as f64 / count as f64)
    }
}

/// Batch-wise filter: all users with age strictly above the threshold.
pub fn users_older_than_in_batches(
    store: &Arc<UserStore>,
    batch_size: usize,
    min_age: i64,
) -> Result<Vec<User>> {
    let mut matched = Vec::new();

    for batch in UserBatches::new(store, batch_size)? {
        for user in batch? {
            if user.age > min_age {
                matched.push(user);
            }
        }
    }

    Ok(matched)
}
