//! Constraint builder
//!
//! Fragments are kept as a `?` template plus ordered identifier arguments
//! and rendered on demand. Identifiers cannot be bound as statement
//! parameters, so rendering inlines them.

use crate::model::{CheckConstraintDescriptor, ForeignKeyAction};
use crate::naming::{Namer, fold_identifier, truncate_with_hash};

/// One positional argument of a constraint template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintArg {
    /// Constraint name
    Name(String),
    /// Table name
    Table(String),
    /// Parenthesized column list
    Columns(Vec<String>),
    /// Raw SQL expression
    Expression(String),
}

impl ConstraintArg {
    pub fn to_sql(&self) -> String {
        match self {
            ConstraintArg::Name(name) | ConstraintArg::Table(name) => name.clone(),
            ConstraintArg::Columns(columns) => format!("({})", columns.join(", ")),
            ConstraintArg::Expression(sql) => sql.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Check,
}

/// A constraint fragment, usable inside CREATE TABLE or after ALTER TABLE ADD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintClause {
    pub name: String,
    pub kind: ConstraintKind,
    pub template: String,
    pub args: Vec<ConstraintArg>,
}

impl ConstraintClause {
    /// Renders the template with its arguments substituted in order
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(self.template.len() + 32);
        let mut args = self.args.iter();
        for (i, piece) in self.template.split('?').enumerate() {
            if i > 0 {
                if let Some(arg) = args.next() {
                    sql.push_str(&arg.to_sql());
                }
            }
            sql.push_str(piece);
        }
        sql
    }

    /// `ALTER TABLE <table> ADD <fragment>`
    pub fn add_statement(&self, table: &str) -> String {
        format!("ALTER TABLE {} ADD {}", table, self.to_sql())
    }
}

/// A foreign key with every name already resolved to warehouse identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

/// Builds constraint fragments, naming them through a [`Namer`]
pub struct ConstraintBuilder<'a> {
    namer: &'a dyn Namer,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(namer: &'a dyn Namer) -> Self {
        Self { namer }
    }

    /// Deterministic name of a foreign key, derived from the owning table,
    /// the referenced table and the key columns
    pub fn foreign_key_name(&self, definition: &ForeignKeyDefinition) -> String {
        let columns: Vec<String> = definition
            .columns
            .iter()
            .map(|c| fold_identifier(c))
            .collect();
        self.namer.relationship_fk_name(
            &fold_identifier(&definition.table),
            &fold_identifier(&definition.referenced_table),
            &columns,
        )
    }

    /// `CONSTRAINT n FOREIGN KEY (cols) REFERENCES t (cols) [ON DELETE a]
    /// [ON UPDATE a] ENFORCED`
    ///
    /// `ENFORCED` is declarative: the warehouse records it but does not check
    /// referential integrity on write.
    pub fn foreign_key(&self, definition: &ForeignKeyDefinition) -> ConstraintClause {
        let name = self.foreign_key_name(definition);
        let mut template = String::from("CONSTRAINT ? FOREIGN KEY ? REFERENCES ? ?");
        if let Some(action) = definition.on_delete {
            template.push_str(" ON DELETE ");
            template.push_str(action.as_sql());
        }
        if let Some(action) = definition.on_update {
            template.push_str(" ON UPDATE ");
            template.push_str(action.as_sql());
        }
        template.push_str(" ENFORCED");

        ConstraintClause {
            name: name.clone(),
            kind: ConstraintKind::ForeignKey,
            template,
            args: vec![
                ConstraintArg::Name(name),
                ConstraintArg::Columns(definition.columns.clone()),
                ConstraintArg::Table(definition.referenced_table.clone()),
                ConstraintArg::Columns(definition.referenced_columns.clone()),
            ],
        }
    }

    /// Name of a check constraint. Explicit names are normalized; otherwise
    /// the name is derived from the table and the checked column, or the
    /// check's 1-based position when it is not attached to a column.
    pub fn check_name(
        &self,
        table: &str,
        column: Option<&str>,
        check: &CheckConstraintDescriptor,
        position: usize,
    ) -> String {
        match (&check.name, column) {
            (Some(name), _) => truncate_with_hash(name),
            (None, Some(column)) => self
                .namer
                .checker_name(&fold_identifier(table), &fold_identifier(column)),
            (None, None) => self
                .namer
                .checker_name(&fold_identifier(table), &position.to_string()),
        }
    }

    /// `CONSTRAINT n CHECK (expr)`
    pub fn check(
        &self,
        table: &str,
        column: Option<&str>,
        check: &CheckConstraintDescriptor,
        position: usize,
    ) -> ConstraintClause {
        let name = self.check_name(table, column, check, position);
        ConstraintClause {
            name: name.clone(),
            kind: ConstraintKind::Check,
            template: "CONSTRAINT ? CHECK (?)".to_string(),
            args: vec![
                ConstraintArg::Name(name),
                ConstraintArg::Expression(check.expression.trim().to_string()),
            ],
        }
    }
}
