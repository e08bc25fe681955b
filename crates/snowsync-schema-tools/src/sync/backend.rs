//! Execution strategy for the migrator

use std::sync::Arc;

use async_trait::async_trait;
use snowsync_core::Connection;

use super::{ResolvedColumn, TableDefinition, add_column_statement, plan_column_migration};
use crate::catalog::{InformationSchemaCatalog, IntrospectedColumn};
use crate::constraint::ConstraintClause;
use crate::typemap::{NormalizedColumn, full_data_type_of};
use crate::{SchemaError, SchemaResult};

/// Introspection and DDL primitives the migrator is driven through.
///
/// DDL methods return the statement they executed, or `None` when nothing
/// needed to run.
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    async fn has_table(&self, table: &str) -> SchemaResult<bool>;

    async fn has_column(&self, table: &str, column: &str) -> SchemaResult<bool>;

    async fn column_types(&self, table: &str) -> SchemaResult<Vec<IntrospectedColumn>>;

    async fn has_constraint(&self, table: &str, constraint: &str) -> SchemaResult<bool>;

    async fn current_database(&self) -> SchemaResult<String>;

    async fn create_table(&self, definition: &TableDefinition) -> SchemaResult<String>;

    async fn add_column(&self, table: &str, column: &ResolvedColumn) -> SchemaResult<String>;

    async fn migrate_column(
        &self,
        table: &str,
        column: &ResolvedColumn,
        live: IntrospectedColumn,
    ) -> SchemaResult<Option<String>>;

    async fn create_constraint(
        &self,
        table: &str,
        constraint: &ConstraintClause,
    ) -> SchemaResult<String>;

    /// Runs an arbitrary DDL statement against `table`
    async fn execute(&self, table: &str, statement: &str) -> SchemaResult<()>;
}

/// Backend that reads INFORMATION_SCHEMA and executes DDL on a live
/// connection
#[derive(Clone)]
pub struct LiveBackend {
    connection: Arc<dyn Connection>,
    catalog: InformationSchemaCatalog,
}

impl LiveBackend {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        let catalog = InformationSchemaCatalog::new(connection.clone());
        Self {
            connection,
            catalog,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.catalog = self.catalog.with_schema(schema);
        self
    }

    pub fn catalog(&self) -> &InformationSchemaCatalog {
        &self.catalog
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

#[async_trait]
impl SchemaBackend for LiveBackend {
    async fn has_table(&self, table: &str) -> SchemaResult<bool> {
        self.catalog.has_table(table).await
    }

    async fn has_column(&self, table: &str, column: &str) -> SchemaResult<bool> {
        self.catalog.has_column(table, column).await
    }

    async fn column_types(&self, table: &str) -> SchemaResult<Vec<IntrospectedColumn>> {
        self.catalog.column_types(table).await
    }

    async fn has_constraint(&self, table: &str, constraint: &str) -> SchemaResult<bool> {
        self.catalog.has_constraint(table, constraint).await
    }

    async fn current_database(&self) -> SchemaResult<String> {
        self.catalog.current_database().await
    }

    async fn create_table(&self, definition: &TableDefinition) -> SchemaResult<String> {
        let sql = definition.to_sql();
        self.execute(&definition.table, &sql).await?;
        Ok(sql)
    }

    async fn add_column(&self, table: &str, column: &ResolvedColumn) -> SchemaResult<String> {
        let sql = add_column_statement(table, &column.name, &full_data_type_of(&column.field));
        self.execute(table, &sql).await?;
        Ok(sql)
    }

    async fn migrate_column(
        &self,
        table: &str,
        column: &ResolvedColumn,
        live: IntrospectedColumn,
    ) -> SchemaResult<Option<String>> {
        let live = NormalizedColumn::new(live);
        let Some(sql) = plan_column_migration(table, column, &live).to_sql() else {
            return Ok(None);
        };
        self.execute(table, &sql).await?;
        Ok(Some(sql))
    }

    async fn create_constraint(
        &self,
        table: &str,
        constraint: &ConstraintClause,
    ) -> SchemaResult<String> {
        let sql = constraint.add_statement(table);
        self.execute(table, &sql).await?;
        Ok(sql)
    }

    #[tracing::instrument(skip(self))]
    async fn execute(&self, table: &str, statement: &str) -> SchemaResult<()> {
        tracing::debug!(sql = %statement, "executing DDL");
        self.connection
            .execute(statement, &[])
            .await
            .map_err(|e| SchemaError::ddl(table, statement, e))?;
        Ok(())
    }
}
