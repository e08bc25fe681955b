//! DDL statement rendering

use crate::constraint::{ConstraintBuilder, ConstraintClause, ForeignKeyDefinition};
use crate::naming::Namer;
use crate::typemap::full_data_type_of;

use super::{MigratorConfig, TableSchema};

/// Everything a `CREATE TABLE` statement needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table: String,
    /// Column name and full type fragment, in field order
    pub columns: Vec<(String, String)>,
    /// Empty when no primary key clause is emitted
    pub primary_key: Vec<String>,
    pub constraints: Vec<ConstraintClause>,
    pub table_options: Option<String>,
    pub change_tracking: bool,
}

impl TableDefinition {
    pub fn build(
        schema: &TableSchema,
        foreign_keys: &[ForeignKeyDefinition],
        namer: &dyn Namer,
        config: &MigratorConfig,
    ) -> Self {
        let builder = ConstraintBuilder::new(namer);

        let columns = schema
            .columns
            .iter()
            .map(|c| (c.name.clone(), full_data_type_of(&c.field)))
            .collect::<Vec<_>>();

        // A raw declared type may carry its own inline PRIMARY KEY.
        let inline_primary_key = schema.columns.iter().any(|c| {
            c.field
                .logical_type
                .as_str()
                .to_uppercase()
                .contains("PRIMARY KEY")
        });
        let primary_key = if inline_primary_key {
            Vec::new()
        } else {
            schema.primary_key()
        };

        let mut constraints = Vec::new();
        if !config.disable_foreign_key_constraints {
            constraints.extend(foreign_keys.iter().map(|fk| builder.foreign_key(fk)));
        }
        for (position, (column, check)) in schema.checks.iter().enumerate() {
            constraints.push(builder.check(&schema.table, column.as_deref(), check, position + 1));
        }

        Self {
            table: schema.table.clone(),
            columns,
            primary_key,
            constraints,
            table_options: config.table_options.clone(),
            change_tracking: config.change_tracking,
        }
    }

    pub fn to_sql(&self) -> String {
        let mut items: Vec<String> = self
            .columns
            .iter()
            .map(|(name, data_type)| format!("{} {}", name, data_type))
            .collect();
        if !self.primary_key.is_empty() {
            items.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        items.extend(self.constraints.iter().map(ConstraintClause::to_sql));

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            items.join(", ")
        );
        if let Some(options) = self.table_options.as_deref().map(str::trim) {
            if !options.is_empty() {
                sql.push(' ');
                sql.push_str(options);
            }
        }
        if self.change_tracking {
            sql.push_str(" CHANGE_TRACKING = TRUE");
        }
        sql
    }
}

pub fn add_column_statement(table: &str, column: &str, full_type: &str) -> String {
    format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, full_type)
}

pub fn drop_table_statement(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}

pub fn rename_table_statement(from: &str, to: &str) -> String {
    format!("ALTER TABLE {} RENAME TO {}", from, to)
}

pub fn drop_constraint_statement(table: &str, constraint: &str) -> String {
    format!("ALTER TABLE {} DROP CONSTRAINT {}", table, constraint)
}
