use super::{DbError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single row of the user table.
///
/// The store holds exactly one table with this shape: a unique identifier,
/// a name, an email address and a numeric age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl User {
    /// Create a user with a fresh v4 identifier.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self::with_id(Uuid::new_v4(), name, email, age)
    }

    /// Create a user with an explicit identifier (seeding, tests).
    pub fn with_id(
        id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Row-level validation applied before any change reaches the table.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::ConstraintViolation(
                "Column 'name' cannot be empty".into(),
            ));
        }

        if self.email.trim().is_empty() {
            return Err(DbError::ConstraintViolation(
                "Column 'email' cannot be empty".into(),
            ));
        }

        if self.age < 0 {
            return Err(DbError::ConstraintViolation(format!(
                "Column 'age' cannot be negative, got {}",
                self.age
            )));
        }

        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> (age {})", self.name, self.email, self.age)
    }
}
