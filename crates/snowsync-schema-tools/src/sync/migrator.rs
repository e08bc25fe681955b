//! Migrator

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snowsync_core::Connection;

use super::{
    AlterAction, ColumnMigration, LiveBackend, ResolvedColumn, ResolvedSchema, SchemaBackend,
    TableDefinition, TableSchema, drop_constraint_statement, drop_table_statement,
    rename_table_statement,
};
use crate::catalog::IntrospectedColumn;
use crate::constraint::{ConstraintClause, ForeignKeyDefinition};
use crate::model::EntityDescriptor;
use crate::naming::{Namer, WarehouseNamer, fold_identifier, truncate_with_hash};
use crate::typemap::{NormalizedColumn, declares_identity, ddl_type_of};
use crate::{SchemaError, SchemaResult};

/// Migrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Restricts introspection to one schema
    pub schema: Option<String>,
    /// Raw options appended to every `CREATE TABLE`
    pub table_options: Option<String>,
    /// Adds `CHANGE_TRACKING = TRUE` to created tables
    pub change_tracking: bool,
    /// Skips foreign keys both at creation and during the constraint diff
    pub disable_foreign_key_constraints: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            schema: None,
            table_options: None,
            change_tracking: true,
            disable_foreign_key_constraints: false,
        }
    }
}

impl MigratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = Some(options.into());
        self
    }

    pub fn without_change_tracking(mut self) -> Self {
        self.change_tracking = false;
        self
    }

    pub fn without_foreign_keys(mut self) -> Self {
        self.disable_foreign_key_constraints = true;
        self
    }
}

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tables_created: usize,
    pub columns_added: usize,
    /// Existing columns compared against their field
    pub columns_migrated: usize,
    /// Compared columns that needed an `ALTER COLUMN`
    pub columns_altered: usize,
    pub constraints_created: usize,
    /// Every DDL statement executed, in order
    pub statements: Vec<String>,
}

impl SyncReport {
    /// Whether the pass found nothing to change
    pub fn is_noop(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn ddl_count(&self) -> usize {
        self.statements.len()
    }
}

/// A table addressed by its literal name or by the entity it stores
#[derive(Debug, Clone, Copy)]
pub enum TableRef<'a> {
    Name(&'a str),
    Entity(&'a EntityDescriptor),
}

impl<'a> From<&'a str> for TableRef<'a> {
    fn from(name: &'a str) -> Self {
        TableRef::Name(name)
    }
}

impl<'a> From<&'a String> for TableRef<'a> {
    fn from(name: &'a String) -> Self {
        TableRef::Name(name.as_str())
    }
}

impl<'a> From<&'a EntityDescriptor> for TableRef<'a> {
    fn from(entity: &'a EntityDescriptor) -> Self {
        TableRef::Entity(entity)
    }
}

/// `CREATE TABLE` definitions for `entities` in creation order, as they
/// would be issued against an empty database
pub fn plan_tables(
    entities: &[EntityDescriptor],
    namer: &dyn Namer,
    config: &MigratorConfig,
) -> SchemaResult<Vec<TableDefinition>> {
    let resolved = ResolvedSchema::resolve(entities, namer)?;
    Ok(resolved
        .iter()
        .map(|(table, fks)| TableDefinition::build(table, fks, namer, config))
        .collect())
}

/// Reconciles entity descriptors with the live warehouse schema.
///
/// Entities are processed one at a time in dependency order and every
/// statement is awaited before the next is issued. A failed statement
/// aborts the pass; statements already executed are not rolled back, and
/// re-running the pass converges.
pub struct Migrator<B: SchemaBackend = LiveBackend> {
    backend: B,
    namer: Arc<dyn Namer>,
    config: MigratorConfig,
}

impl Migrator<LiveBackend> {
    /// Migrator executing on a live connection
    pub fn live(connection: Arc<dyn Connection>, config: MigratorConfig) -> Self {
        let mut backend = LiveBackend::new(connection);
        if let Some(schema) = &config.schema {
            backend = backend.with_schema(schema.clone());
        }
        Self::new(backend).with_config(config)
    }
}

impl<B: SchemaBackend> Migrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            namer: Arc::new(<WarehouseNamer>::default()),
            config: MigratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_namer(mut self, namer: Arc<dyn Namer>) -> Self {
        self.namer = namer;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    pub fn namer(&self) -> &dyn Namer {
        self.namer.as_ref()
    }

    /// Dependency-ordered, name-resolved view of `entities`
    pub fn resolve(&self, entities: &[EntityDescriptor]) -> SchemaResult<ResolvedSchema> {
        ResolvedSchema::resolve(entities, self.namer.as_ref())
    }

    /// `CREATE TABLE` definitions in creation order, without touching the
    /// warehouse
    pub fn plan(&self, entities: &[EntityDescriptor]) -> SchemaResult<Vec<TableDefinition>> {
        plan_tables(entities, self.namer(), &self.config)
    }

    /// Brings the live schema in line with `entities`.
    ///
    /// Missing tables are created whole. Existing tables get missing
    /// columns added, drifted columns altered and missing constraints
    /// created. Nothing is ever dropped.
    #[tracing::instrument(skip_all, fields(entities = entities.len()))]
    pub async fn synchronize(&self, entities: &[EntityDescriptor]) -> SchemaResult<SyncReport> {
        let resolved = self.resolve(entities)?;
        let mut report = SyncReport::default();

        for (table, foreign_keys) in resolved.iter() {
            self.synchronize_table(table, foreign_keys, &mut report)
                .await?;
        }

        tracing::info!(
            tables_created = report.tables_created,
            columns_added = report.columns_added,
            columns_altered = report.columns_altered,
            constraints_created = report.constraints_created,
            "schema synchronized"
        );
        Ok(report)
    }

    async fn synchronize_table(
        &self,
        table: &TableSchema,
        foreign_keys: &[ForeignKeyDefinition],
        report: &mut SyncReport,
    ) -> SchemaResult<()> {
        let definition = TableDefinition::build(table, foreign_keys, self.namer(), &self.config);

        if !self.backend.has_table(&table.table).await? {
            let sql = self.backend.create_table(&definition).await?;
            report.tables_created += 1;
            report.statements.push(sql);
            return Ok(());
        }

        let live = self.backend.column_types(&table.table).await?;
        for column in &table.columns {
            let folded = fold_identifier(&column.name);
            match live.iter().find(|c| fold_identifier(&c.name) == folded) {
                None => {
                    let sql = self.backend.add_column(&table.table, column).await?;
                    report.columns_added += 1;
                    report.statements.push(sql);
                }
                Some(live_column) => {
                    report.columns_migrated += 1;
                    if let Some(sql) = self
                        .backend
                        .migrate_column(&table.table, column, live_column.clone())
                        .await?
                    {
                        report.columns_altered += 1;
                        report.statements.push(sql);
                    }
                }
            }
        }

        for constraint in &definition.constraints {
            if self
                .backend
                .has_constraint(&table.table, &constraint.name)
                .await?
            {
                continue;
            }
            let sql = self
                .backend
                .create_constraint(&table.table, constraint)
                .await?;
            report.constraints_created += 1;
            report.statements.push(sql);
        }

        Ok(())
    }

    /// Issues `CREATE TABLE IF NOT EXISTS` for every entity, in dependency
    /// order, without diffing
    pub async fn create_tables(&self, entities: &[EntityDescriptor]) -> SchemaResult<Vec<String>> {
        let mut statements = Vec::with_capacity(entities.len());
        for definition in self.plan(entities)? {
            statements.push(self.backend.create_table(&definition).await?);
        }
        Ok(statements)
    }

    /// Drops every entity's table, referencers before the tables they
    /// reference
    pub async fn drop_tables(&self, entities: &[EntityDescriptor]) -> SchemaResult<Vec<String>> {
        let resolved = self.resolve(entities)?;
        let mut statements = Vec::with_capacity(resolved.tables.len());
        for table in resolved.tables.iter().rev() {
            let sql = drop_table_statement(&table.table);
            self.backend.execute(&table.table, &sql).await?;
            statements.push(sql);
        }
        Ok(statements)
    }

    pub async fn drop_table<'a>(&self, table: impl Into<TableRef<'a>>) -> SchemaResult<String> {
        let table = self.table_name(table.into());
        let sql = drop_table_statement(&table);
        self.backend.execute(&table, &sql).await?;
        Ok(sql)
    }

    pub async fn rename_table<'a, 'b>(
        &self,
        from: impl Into<TableRef<'a>>,
        to: impl Into<TableRef<'b>>,
    ) -> SchemaResult<String> {
        let from = self.table_name(from.into());
        let to = self.table_name(to.into());
        let sql = rename_table_statement(&from, &to);
        self.backend.execute(&from, &sql).await?;
        Ok(sql)
    }

    pub async fn has_table<'a>(&self, table: impl Into<TableRef<'a>>) -> SchemaResult<bool> {
        let table = self.table_name(table.into());
        self.backend.has_table(&table).await
    }

    /// Whether the live table has the column a field maps to. Plain table
    /// names take `column` as the literal column name.
    pub async fn has_column<'a>(
        &self,
        table: impl Into<TableRef<'a>>,
        column: &str,
    ) -> SchemaResult<bool> {
        let (table, column) = match table.into() {
            TableRef::Name(name) => (name.to_uppercase(), column.to_string()),
            TableRef::Entity(entity) => {
                let schema = TableSchema::resolve(entity, self.namer())?;
                let column = schema
                    .column(column)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| column.to_string());
                (schema.table, column)
            }
        };
        self.backend.has_column(&table, &column).await
    }

    /// Live columns with their types normalized for comparison
    pub async fn column_types<'a>(
        &self,
        table: impl Into<TableRef<'a>>,
    ) -> SchemaResult<Vec<NormalizedColumn<IntrospectedColumn>>> {
        let table = self.table_name(table.into());
        let columns = self.backend.column_types(&table).await?;
        Ok(columns.into_iter().map(NormalizedColumn::new).collect())
    }

    pub async fn add_column(&self, entity: &EntityDescriptor, field: &str) -> SchemaResult<String> {
        let schema = TableSchema::resolve(entity, self.namer())?;
        let column = schema.require_column(field)?;
        self.backend.add_column(&schema.table, column).await
    }

    /// Re-declares a column's type and nullability unconditionally
    pub async fn alter_column(
        &self,
        entity: &EntityDescriptor,
        field: &str,
    ) -> SchemaResult<String> {
        let schema = TableSchema::resolve(entity, self.namer())?;
        let column = schema.require_column(field)?;
        let data_type = ddl_type_of(&column.field);
        if column.field.auto_increment || declares_identity(&data_type) {
            return Err(SchemaError::Unsupported(
                "ALTER COLUMN on identity column".to_string(),
            ));
        }

        let nullability = if column.field.is_required() {
            AlterAction::SetNotNull
        } else {
            AlterAction::DropNotNull
        };
        let migration = ColumnMigration {
            table: schema.table.clone(),
            column: column.name.clone(),
            actions: vec![AlterAction::SetDataType(data_type), nullability],
        };
        let sql = migration.to_sql().unwrap_or_default();
        self.backend.execute(&schema.table, &sql).await?;
        Ok(sql)
    }

    /// Compares one field with its live column and alters it if needed
    pub async fn migrate_column(
        &self,
        entity: &EntityDescriptor,
        field: &str,
    ) -> SchemaResult<Option<String>> {
        let schema = TableSchema::resolve(entity, self.namer())?;
        let column = schema.require_column(field)?;
        let live = self.live_column(&schema.table, column).await?;
        self.backend
            .migrate_column(&schema.table, column, live)
            .await
    }

    async fn live_column(
        &self,
        table: &str,
        column: &ResolvedColumn,
    ) -> SchemaResult<IntrospectedColumn> {
        let folded = fold_identifier(&column.name);
        self.backend
            .column_types(table)
            .await?
            .into_iter()
            .find(|c| fold_identifier(&c.name) == folded)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: table.to_string(),
                field: column.name.clone(),
            })
    }

    /// The warehouse has no safe column rename; always fails
    pub async fn rename_column(
        &self,
        _entity: &EntityDescriptor,
        _old_name: &str,
        _new_name: &str,
    ) -> SchemaResult<()> {
        Err(SchemaError::Unsupported("RENAME COLUMN".to_string()))
    }

    /// Indexes do not exist on the warehouse; every index is reported
    /// present
    pub async fn has_index(&self, _entity: &EntityDescriptor, _name: &str) -> SchemaResult<bool> {
        Ok(true)
    }

    pub async fn create_index(&self, entity: &EntityDescriptor, name: &str) -> SchemaResult<()> {
        tracing::debug!(entity = %entity.name, index = %name, "index creation skipped");
        Ok(())
    }

    pub async fn drop_index(&self, entity: &EntityDescriptor, name: &str) -> SchemaResult<()> {
        tracing::debug!(entity = %entity.name, index = %name, "index drop skipped");
        Ok(())
    }

    pub async fn rename_index(
        &self,
        entity: &EntityDescriptor,
        old_name: &str,
        new_name: &str,
    ) -> SchemaResult<()> {
        tracing::debug!(
            entity = %entity.name,
            from = %old_name,
            to = %new_name,
            "index rename skipped"
        );
        Ok(())
    }

    /// Whether a constraint exists live. `name` may be a declared check
    /// name or a generated constraint name.
    pub async fn has_constraint(&self, entity: &EntityDescriptor, name: &str) -> SchemaResult<bool> {
        let (table, constraints) = self.entity_constraints(entity)?;
        let constraint = find_constraint(&constraints, name)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| name.to_uppercase());
        self.backend.has_constraint(&table, &constraint).await
    }

    /// Adds one of the entity's declared constraints by name
    pub async fn create_constraint(
        &self,
        entity: &EntityDescriptor,
        name: &str,
    ) -> SchemaResult<String> {
        let (table, constraints) = self.entity_constraints(entity)?;
        let constraint =
            find_constraint(&constraints, name).ok_or_else(|| SchemaError::UnknownConstraint {
                table: table.clone(),
                name: name.to_string(),
            })?;
        self.backend.create_constraint(&table, constraint).await
    }

    pub async fn drop_constraint(
        &self,
        entity: &EntityDescriptor,
        name: &str,
    ) -> SchemaResult<String> {
        let (table, constraints) = self.entity_constraints(entity)?;
        let constraint = find_constraint(&constraints, name)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| name.to_uppercase());
        let sql = drop_constraint_statement(&table, &constraint);
        self.backend.execute(&table, &sql).await?;
        Ok(sql)
    }

    pub async fn current_database(&self) -> SchemaResult<String> {
        self.backend.current_database().await
    }

    fn table_name(&self, table: TableRef<'_>) -> String {
        match table {
            TableRef::Name(name) => name.to_uppercase(),
            TableRef::Entity(entity) => self.namer.table_name(&entity.name),
        }
    }

    /// Every constraint the entity declares, foreign keys included even when
    /// the config disables them during synchronization
    fn entity_constraints(
        &self,
        entity: &EntityDescriptor,
    ) -> SchemaResult<(String, Vec<ConstraintClause>)> {
        let resolved = self.resolve(std::slice::from_ref(entity))?;
        let (table, foreign_keys) =
            resolved
                .table(&entity.name)
                .ok_or_else(|| SchemaError::InvalidEntity {
                    entity: entity.name.clone(),
                    reason: "entity did not resolve to a table".to_string(),
                })?;
        let config = MigratorConfig {
            disable_foreign_key_constraints: false,
            ..self.config.clone()
        };
        let definition = TableDefinition::build(table, foreign_keys, self.namer(), &config);
        Ok((definition.table, definition.constraints))
    }
}

fn find_constraint<'c>(constraints: &'c [ConstraintClause], name: &str) -> Option<&'c ConstraintClause> {
    let folded = fold_identifier(name);
    let hashed = fold_identifier(&truncate_with_hash(name));
    constraints.iter().find(|c| {
        let candidate = fold_identifier(&c.name);
        candidate == folded || candidate == hashed
    })
}
