//! Savepoint support for transactions
//!
//! The warehouse has no savepoints, so implementations of this trait are
//! free to approximate them. Callers should check `supports_savepoints`
//! before relying on partial-rollback semantics.

use crate::Result;
use async_trait::async_trait;

/// A named savepoint within a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    name: String,
}

impl Savepoint {
    /// Create a new savepoint with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Get the name of the savepoint.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Trait for transactions that expose savepoint operations.
///
/// # Example
/// ```ignore
/// let tx = conn.begin_transaction().await?;
/// tx.execute("INSERT INTO USERS VALUES (1, 'Alice')", &[]).await?;
/// tx.savepoint("before_bob").await?;
/// tx.execute("INSERT INTO USERS VALUES (2, 'Bob')", &[]).await?;
/// // On transports without real savepoints this undoes Alice too.
/// tx.rollback_to_savepoint("before_bob").await?;
/// ```
#[async_trait]
pub trait SavepointSupport: Send + Sync {
    /// Create a savepoint with the given name.
    async fn savepoint(&self, name: &str) -> Result<Savepoint>;

    /// Rollback to a previously created savepoint.
    async fn rollback_to_savepoint(&self, name: &str) -> Result<()>;

    /// Release (delete) a savepoint.
    async fn release_savepoint(&self, name: &str) -> Result<()>;

    /// Whether savepoints carry true partial-rollback semantics.
    fn supports_savepoints(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savepoint_new() {
        let sp = Savepoint::new("test_savepoint");
        assert_eq!(sp.name(), "test_savepoint");
    }

    #[test]
    fn test_savepoint_equality() {
        assert_eq!(Savepoint::new("same"), Savepoint::new(String::from("same")));
        assert_ne!(Savepoint::new("same"), Savepoint::new("different"));
    }
}
