//! INFORMATION_SCHEMA queries

use std::sync::Arc;

use snowsync_core::{Connection, CoreError, Row, Value};

use super::IntrospectedColumn;
use crate::naming::fold_identifier;
use crate::{SchemaError, SchemaResult};

const COLUMNS_QUERY: &str = "SELECT COLUMN_NAME, DATA_TYPE, CHARACTER_MAXIMUM_LENGTH, \
     NUMERIC_PRECISION, NUMERIC_SCALE, IS_NULLABLE, COLUMN_DEFAULT, IS_IDENTITY, COMMENT \
     FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = ?";

/// Reads live metadata through a caller-owned connection
#[derive(Clone)]
pub struct InformationSchemaCatalog {
    connection: Arc<dyn Connection>,
    schema: Option<String>,
}

impl InformationSchemaCatalog {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            schema: None,
        }
    }

    /// Restricts every lookup to one TABLE_SCHEMA
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(fold_identifier(&schema.into()));
        self
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Appends the TABLE_SCHEMA filter when one is configured
    fn scoped(&self, sql: &str, mut params: Vec<Value>) -> (String, Vec<Value>) {
        match &self.schema {
            Some(schema) => {
                params.push(Value::String(schema.clone()));
                (format!("{} AND TABLE_SCHEMA = ?", sql), params)
            }
            None => (sql.to_string(), params),
        }
    }

    async fn count(&self, table: &str, sql: &str, params: Vec<Value>) -> SchemaResult<i64> {
        let (sql, params) = self.scoped(sql, params);
        tracing::debug!(table = %table, sql = %sql, "introspecting");
        let result = self
            .connection
            .query(&sql, &params)
            .await
            .map_err(|e| SchemaError::introspection(table, e))?;
        result.scalar().and_then(Value::as_i64).ok_or_else(|| {
            SchemaError::introspection(
                table,
                CoreError::Query(format!("no numeric count returned by: {}", sql)),
            )
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn has_table(&self, table: &str) -> SchemaResult<bool> {
        let count = self
            .count(
                table,
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = ?",
                vec![Value::String(fold_identifier(table))],
            )
            .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    pub async fn has_column(&self, table: &str, column: &str) -> SchemaResult<bool> {
        let count = self
            .count(
                table,
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = ? AND COLUMN_NAME = ?",
                vec![
                    Value::String(fold_identifier(table)),
                    Value::String(fold_identifier(column)),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    pub async fn has_constraint(&self, table: &str, constraint: &str) -> SchemaResult<bool> {
        let count = self
            .count(
                table,
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS WHERE CONSTRAINT_NAME = ? AND TABLE_NAME = ?",
                vec![
                    Value::String(fold_identifier(constraint)),
                    Value::String(fold_identifier(table)),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    /// Live columns of `table` in ordinal order
    #[tracing::instrument(skip(self))]
    pub async fn column_types(&self, table: &str) -> SchemaResult<Vec<IntrospectedColumn>> {
        let (sql, params) = self.scoped(COLUMNS_QUERY, vec![Value::String(fold_identifier(table))]);
        let sql = format!("{} ORDER BY ORDINAL_POSITION", sql);

        let result = self
            .connection
            .query(&sql, &params)
            .await
            .map_err(|e| SchemaError::introspection(table, e))?;

        let columns: Vec<IntrospectedColumn> = result.rows.iter().map(column_from_row).collect();
        tracing::debug!(table = %table, columns = columns.len(), "loaded column types");
        Ok(columns)
    }

    pub async fn current_database(&self) -> SchemaResult<String> {
        let result = self
            .connection
            .query("SELECT CURRENT_DATABASE()", &[])
            .await
            .map_err(|e| SchemaError::introspection("CURRENT_DATABASE()", e))?;
        match result.scalar().and_then(Value::as_str) {
            Some(database) if !database.trim().is_empty() => Ok(database.to_string()),
            _ => Err(SchemaError::introspection(
                "CURRENT_DATABASE()",
                CoreError::Query("no current database returned".into()),
            )),
        }
    }
}

fn text(row: &Row, index: usize) -> Option<String> {
    match row.get(index)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn number(row: &Row, index: usize) -> Option<i64> {
    row.get(index).and_then(Value::as_i64)
}

fn column_from_row(row: &Row) -> IntrospectedColumn {
    IntrospectedColumn {
        name: text(row, 0).unwrap_or_default(),
        data_type: text(row, 1).unwrap_or_default(),
        length: number(row, 2).and_then(|n| u64::try_from(n).ok()),
        precision: number(row, 3).and_then(|n| u32::try_from(n).ok()),
        scale: number(row, 4).and_then(|n| u32::try_from(n).ok()),
        nullable: row.get(5).and_then(Value::as_bool),
        default_value: text(row, 6),
        primary_key: None,
        auto_increment: row.get(7).and_then(Value::as_bool),
        unique: None,
        comment: text(row, 8),
    }
}
