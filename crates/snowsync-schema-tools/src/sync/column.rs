//! Column diffing

use crate::catalog::ColumnType;
use crate::model::LogicalType;
use crate::typemap::{NormalizedColumn, ddl_type_of, declared_category, effective_string_size};

use super::ResolvedColumn;

/// One clause of an `ALTER COLUMN`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    SetDataType(String),
    SetNotNull,
    DropNotNull,
}

impl AlterAction {
    pub fn to_sql(&self) -> String {
        match self {
            AlterAction::SetDataType(data_type) => format!("SET DATA TYPE {}", data_type),
            AlterAction::SetNotNull => "SET NOT NULL".to_string(),
            AlterAction::DropNotNull => "DROP NOT NULL".to_string(),
        }
    }
}

/// Alterations needed to bring one live column in line with its field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMigration {
    pub table: String,
    pub column: String,
    pub actions: Vec<AlterAction>,
}

impl ColumnMigration {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// A single statement carrying every action:
    /// `ALTER TABLE T ALTER COLUMN C SET DATA TYPE X, COLUMN C SET NOT NULL`
    pub fn to_sql(&self) -> Option<String> {
        if self.actions.is_empty() {
            return None;
        }
        let clauses = self
            .actions
            .iter()
            .map(|action| format!("COLUMN {} {}", self.column, action.to_sql()))
            .collect::<Vec<_>>();
        Some(format!("ALTER TABLE {} ALTER {}", self.table, clauses.join(", ")))
    }
}

/// Compares a desired column with its live counterpart.
///
/// Identity columns are never altered. Types are compared by category, so
/// a declared `VARCHAR(n)` matches a live `TEXT`. String lengths are
/// compared only when the field has a bounded size and the catalog reports
/// a length. Nullability is not compared for primary-key fields.
pub fn plan_column_migration<C: ColumnType>(
    table: &str,
    column: &ResolvedColumn,
    live: &NormalizedColumn<C>,
) -> ColumnMigration {
    let mut migration = ColumnMigration {
        table: table.to_string(),
        column: column.name.clone(),
        actions: Vec::new(),
    };
    let field = &column.field;

    if field.auto_increment {
        tracing::debug!(table = %table, column = %column.name, "identity column left unchanged");
        return migration;
    }

    let expected = ddl_type_of(field);
    let type_mismatch = declared_category(&expected) != *live.category();

    let mut length_mismatch = false;
    if field.logical_type == LogicalType::String {
        if let Some(size) = effective_string_size(field) {
            match live.length() {
                Some(length) => length_mismatch = length != u64::from(size),
                None => tracing::debug!(
                    table = %table,
                    column = %column.name,
                    "catalog reported no length, skipping length comparison"
                ),
            }
        }
    }

    if type_mismatch || length_mismatch {
        tracing::warn!(
            table = %table,
            column = %column.name,
            expected = %expected,
            actual = %live.inner().database_type_name(),
            actual_length = ?live.length(),
            "data type or length differs, will alter column"
        );
        migration.actions.push(AlterAction::SetDataType(expected));
    }

    if !field.primary_key {
        if let Some(live_nullable) = live.nullable() {
            if field.nullable != live_nullable {
                let action = if field.nullable {
                    AlterAction::DropNotNull
                } else {
                    AlterAction::SetNotNull
                };
                tracing::warn!(
                    table = %table,
                    column = %column.name,
                    change = %action.to_sql(),
                    "nullability differs, will alter column"
                );
                migration.actions.push(action);
            }
        }
    }

    migration
}
