// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Implements the Command Pattern for buffered table operations.
// Each Change is recorded during transaction execution, applied during
// COMMIT and discarded during ROLLBACK.
//
// ============================================================================

use crate::core::User;
use uuid::Uuid;

/// A single buffered change against the user table
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert a new row
    Insert { user: User },

    /// Replace an existing row (matched by id)
    Update { user: User },

    /// Delete an existing row
    Delete { id: Uuid },
}

impl Change {
    /// Statement keyword for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Insert { .. } => "INSERT",
            Change::Update { .. } => "UPDATE",
            Change::Delete { .. } => "DELETE",
        }
    }

    /// The row identifier this change targets
    pub fn target(&self) -> Uuid {
        match self {
            Change::Insert { user } | Change::Update { user } => user.id,
            Change::Delete { id } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind() {
        let user = User::new("Alice", "alice@example.com", 30);
        let id = user.id;

        assert_eq!(Change::Insert { user: user.clone() }.kind(), "INSERT");
        assert_eq!(Change::Update { user }.kind(), "UPDATE");
        assert_eq!(Change::Delete { id }.kind(), "DELETE");
    }

    #[test]
    fn test_change_target() {
        let user = User::new("Alice", "alice@example.com", 30);
        let id = user.id;

        assert_eq!(Change::Insert { user }.target(), id);
        assert_eq!(Change::Delete { id }.target(), id);
    }
}
