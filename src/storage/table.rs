use crate::core::{DbError, Result, User};
use crate::transaction::Change;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The single user table: committed rows keyed by id.
///
/// Uncommitted changes never touch this structure; they stay buffered in
/// a [`Transaction`](crate::transaction::Transaction) until commit. That is
/// the rollback guarantee the policy layer relies on.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    rows: BTreeMap<Uuid, User>,
}

impl UserTable {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Apply one change, returning the number of affected rows.
    pub fn apply(&mut self, change: Change) -> Result<u64> {
        match change {
            Change::Insert { user } => {
                user.validate()?;
                if self.rows.contains_key(&user.id) {
                    return Err(DbError::ConstraintViolation(format!(
                        "Duplicate id '{}' in user table",
                        user.id
                    )));
                }
                self.rows.insert(user.id, user);
                Ok(1)
            }
            Change::Update { user } => {
                user.validate()?;
                match self.rows.get_mut(&user.id) {
                    Some(slot) => {
                        *slot = user;
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
            Change::Delete { id } => Ok(u64::from(self.rows.remove(&id).is_some())),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&User> {
        self.rows.get(id)
    }

    /// All rows in id order.
    pub fn scan(&self) -> Vec<User> {
        self.rows.values().cloned().collect()
    }

    /// One page of rows in id order.
    pub fn page(&self, limit: usize, offset: usize) -> Vec<User> {
        self.rows.values().skip(offset).take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
