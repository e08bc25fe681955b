//! Savepoint emulation
//!
//! The warehouse has no savepoints. Creating or releasing one succeeds
//! without doing anything, and rolling back to one rolls back the whole
//! transaction.

use async_trait::async_trait;
use snowsync_core::{QueryResult, Result, Savepoint, SavepointSupport, StatementResult, Transaction, Value};

/// Transaction wrapper exposing the emulated savepoint operations
pub struct SavepointTransaction {
    inner: Box<dyn Transaction>,
}

impl SavepointTransaction {
    pub fn new(inner: Box<dyn Transaction>) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> Box<dyn Transaction> {
        self.inner
    }
}

#[async_trait]
impl Transaction for SavepointTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.inner.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.inner.execute(sql, params).await
    }
}

#[async_trait]
impl SavepointSupport for SavepointTransaction {
    async fn savepoint(&self, name: &str) -> Result<Savepoint> {
        tracing::debug!(savepoint = %name, "savepoint requested, nothing to create");
        Ok(Savepoint::new(name))
    }

    async fn rollback_to_savepoint(&self, name: &str) -> Result<()> {
        tracing::warn!(savepoint = %name, "rolling back the whole transaction in place of a savepoint");
        self.inner.execute("ROLLBACK", &[]).await?;
        Ok(())
    }

    async fn release_savepoint(&self, name: &str) -> Result<()> {
        tracing::debug!(savepoint = %name, "savepoint release requested, nothing to release");
        Ok(())
    }

    fn supports_savepoints(&self) -> bool {
        false
    }
}
