//! Tests for the migrator driven through a recording backend

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::*;
use crate::catalog::{ColumnType, IntrospectedColumn};
use crate::constraint::ConstraintClause;
use crate::model::{
    CheckConstraintDescriptor, EntityDescriptor, FieldDescriptor, LogicalType,
    RelationshipDescriptor,
};
use crate::naming::fold_identifier;
use crate::test_support::{order, user};
use crate::{SchemaError, SchemaResult};
use pretty_assertions::assert_eq;

/// Operations the migrator issued, in order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    CreateTable(String),
    AddColumn(String, String),
    MigrateColumn(String, String),
    CreateConstraint(String, String),
    Execute(String),
}

/// Backend over an in-memory table map. Migrations are recorded but only
/// report an alteration when the column is listed in `drifted`.
#[derive(Default)]
struct RecordingBackend {
    tables: HashMap<String, Vec<IntrospectedColumn>>,
    constraints: Vec<(String, String)>,
    drifted: Vec<String>,
    ops: Mutex<Vec<Op>>,
}

impl RecordingBackend {
    fn with_table(mut self, table: &str, columns: Vec<IntrospectedColumn>) -> Self {
        self.tables.insert(table.to_string(), columns);
        self
    }

    fn with_constraint(mut self, table: &str, name: &str) -> Self {
        self.constraints.push((table.to_string(), name.to_string()));
        self
    }

    fn with_drifted(mut self, column: &str) -> Self {
        self.drifted.push(column.to_string());
        self
    }

    fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    fn count(&self, matches: impl Fn(&Op) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| matches(op)).count()
    }
}

#[async_trait]
impl SchemaBackend for RecordingBackend {
    async fn has_table(&self, table: &str) -> SchemaResult<bool> {
        Ok(self.tables.contains_key(&fold_identifier(table)))
    }

    async fn has_column(&self, table: &str, column: &str) -> SchemaResult<bool> {
        let column = fold_identifier(column);
        Ok(self
            .tables
            .get(&fold_identifier(table))
            .is_some_and(|columns| columns.iter().any(|c| c.name == column)))
    }

    async fn column_types(&self, table: &str) -> SchemaResult<Vec<IntrospectedColumn>> {
        Ok(self
            .tables
            .get(&fold_identifier(table))
            .cloned()
            .unwrap_or_default())
    }

    async fn has_constraint(&self, table: &str, constraint: &str) -> SchemaResult<bool> {
        Ok(self
            .constraints
            .iter()
            .any(|(t, c)| t == table && c == constraint))
    }

    async fn current_database(&self) -> SchemaResult<String> {
        Ok("ANALYTICS".to_string())
    }

    async fn create_table(&self, definition: &TableDefinition) -> SchemaResult<String> {
        self.ops.lock().push(Op::CreateTable(definition.table.clone()));
        Ok(definition.to_sql())
    }

    async fn add_column(&self, table: &str, column: &ResolvedColumn) -> SchemaResult<String> {
        self.ops
            .lock()
            .push(Op::AddColumn(table.to_string(), column.name.clone()));
        Ok(format!("ADD {}", column.name))
    }

    async fn migrate_column(
        &self,
        table: &str,
        column: &ResolvedColumn,
        _live: IntrospectedColumn,
    ) -> SchemaResult<Option<String>> {
        self.ops
            .lock()
            .push(Op::MigrateColumn(table.to_string(), column.name.clone()));
        Ok(self
            .drifted
            .contains(&column.name)
            .then(|| format!("ALTER {}", column.name)))
    }

    async fn create_constraint(
        &self,
        table: &str,
        constraint: &ConstraintClause,
    ) -> SchemaResult<String> {
        self.ops.lock().push(Op::CreateConstraint(
            table.to_string(),
            constraint.name.clone(),
        ));
        Ok(constraint.add_statement(table))
    }

    async fn execute(&self, _table: &str, statement: &str) -> SchemaResult<()> {
        self.ops.lock().push(Op::Execute(statement.to_string()));
        Ok(())
    }
}

fn live(name: &str, data_type: &str) -> IntrospectedColumn {
    IntrospectedColumn::new(name, data_type).with_nullable(true)
}

#[tokio::test]
async fn test_absent_table_is_created_without_alters() {
    let migrator = Migrator::new(RecordingBackend::default());

    let report = migrator.synchronize(&[user()]).await.unwrap();

    assert_eq!(
        migrator.backend().ops(),
        vec![Op::CreateTable("USERS".into())]
    );
    assert_eq!(report.tables_created, 1);
    assert_eq!(report.columns_added, 0);
    assert_eq!(report.columns_altered, 0);
    assert_eq!(report.ddl_count(), 1);
}

#[tokio::test]
async fn test_tables_created_in_dependency_order() {
    let migrator = Migrator::new(RecordingBackend::default());

    migrator.synchronize(&[order(), user()]).await.unwrap();

    assert_eq!(
        migrator.backend().ops(),
        vec![
            Op::CreateTable("USERS".into()),
            Op::CreateTable("ORDERS".into()),
        ]
    );
}

#[tokio::test]
async fn test_two_missing_columns_are_added_without_migrations() {
    let backend = RecordingBackend::default().with_table("USERS", vec![live("LEGACY", "TEXT")]);
    let migrator = Migrator::new(backend);
    let entity = EntityDescriptor::new("User")
        .with_field(FieldDescriptor::new("name", LogicalType::String))
        .with_field(FieldDescriptor::new("email", LogicalType::String));

    let report = migrator.synchronize(&[entity]).await.unwrap();

    let backend = migrator.backend();
    assert_eq!(
        backend.count(|op| matches!(op, Op::AddColumn(..))),
        2,
        "ops: {:?}",
        backend.ops()
    );
    assert_eq!(backend.count(|op| matches!(op, Op::MigrateColumn(..))), 0);
    assert_eq!(report.columns_added, 2);
    assert_eq!(report.columns_migrated, 0);
}

#[tokio::test]
async fn test_existing_columns_are_matched_case_insensitively() {
    let backend = RecordingBackend::default().with_table(
        "USERS",
        vec![live("ID", "NUMBER"), live("name", "TEXT"), live("EMAIL", "TEXT")],
    );
    let migrator = Migrator::new(backend);

    let report = migrator.synchronize(&[user()]).await.unwrap();

    assert_eq!(report.columns_added, 0);
    assert_eq!(report.columns_migrated, 3);
    assert_eq!(report.columns_altered, 0);
    assert!(report.is_noop());
}

#[tokio::test]
async fn test_drifted_column_is_reported_as_altered() {
    let backend = RecordingBackend::default()
        .with_table(
            "USERS",
            vec![live("ID", "NUMBER"), live("NAME", "TEXT"), live("EMAIL", "TEXT")],
        )
        .with_drifted("NAME");
    let migrator = Migrator::new(backend);

    let report = migrator.synchronize(&[user()]).await.unwrap();

    assert_eq!(report.columns_altered, 1);
    assert_eq!(report.statements, vec!["ALTER NAME".to_string()]);
}

#[tokio::test]
async fn test_missing_constraints_are_created_on_existing_table() {
    let backend = RecordingBackend::default()
        .with_table("USERS", vec![live("ID", "NUMBER")])
        .with_table(
            "ORDERS",
            vec![live("ID", "NUMBER"), live("USER_ID", "NUMBER"), live("TOTAL", "FLOAT")],
        )
        .with_constraint("ORDERS", "CHK_ORDERS_TOTAL");
    let migrator = Migrator::new(backend);

    let report = migrator.synchronize(&[user(), order()]).await.unwrap();

    assert_eq!(report.constraints_created, 1);
    assert!(migrator.backend().ops().contains(&Op::CreateConstraint(
        "ORDERS".into(),
        "FK_ORDERS_USERS_USER_ID".into()
    )));
}

#[tokio::test]
async fn test_disabled_foreign_keys_are_not_diffed() {
    let backend = RecordingBackend::default()
        .with_table("USERS", vec![live("ID", "NUMBER")])
        .with_table(
            "ORDERS",
            vec![live("ID", "NUMBER"), live("USER_ID", "NUMBER"), live("TOTAL", "FLOAT")],
        );
    let migrator =
        Migrator::new(backend).with_config(MigratorConfig::new().without_foreign_keys());

    migrator.synchronize(&[user(), order()]).await.unwrap();

    assert_eq!(
        migrator
            .backend()
            .count(|op| matches!(op, Op::CreateConstraint(..))),
        1
    );
    assert!(migrator.backend().ops().contains(&Op::CreateConstraint(
        "ORDERS".into(),
        "CHK_ORDERS_TOTAL".into()
    )));
}

#[tokio::test]
async fn test_cycle_fails_before_any_ddl() {
    let a = EntityDescriptor::new("A")
        .with_field(FieldDescriptor::new("b_id", LogicalType::Int))
        .with_relationship(RelationshipDescriptor::new(["b_id"], "B", ["id"]));
    let b = EntityDescriptor::new("B")
        .with_field(FieldDescriptor::new("a_id", LogicalType::Int))
        .with_relationship(RelationshipDescriptor::new(["a_id"], "A", ["id"]));
    let migrator = Migrator::new(RecordingBackend::default());

    let err = migrator.synchronize(&[a, b]).await.unwrap_err();

    assert!(matches!(err, SchemaError::DependencyCycle(_)));
    assert!(migrator.backend().ops().is_empty());
}

#[tokio::test]
async fn test_two_unnamed_checks_on_one_column_are_rejected() {
    let order = order().with_check(CheckConstraintDescriptor::on_field("total", "TOTAL < 1000000"));
    let migrator = Migrator::new(RecordingBackend::default());

    let err = migrator.synchronize(&[user(), order]).await.unwrap_err();

    match err {
        SchemaError::InvalidEntity { entity, reason } => {
            assert_eq!(entity, "Order");
            assert!(reason.contains("CHK_ORDERS_TOTAL"), "{}", reason);
        }
        other => panic!("expected invalid entity, got {:?}", other),
    }
    assert!(migrator.backend().ops().is_empty());
}

#[tokio::test]
async fn test_explicitly_named_second_check_is_accepted() {
    let mut ceiling = CheckConstraintDescriptor::on_field("total", "TOTAL < 1000000");
    ceiling.name = Some("chk_orders_total_ceiling".into());
    let order = order().with_check(ceiling);
    let migrator = Migrator::new(RecordingBackend::default());

    let report = migrator.synchronize(&[user(), order]).await.unwrap();

    assert_eq!(report.tables_created, 2);
}

#[tokio::test]
async fn test_rename_column_is_unsupported() {
    let migrator = Migrator::new(RecordingBackend::default());

    for (old, new) in [("name", "full_name"), ("", ""), ("id", "id")] {
        let err = migrator.rename_column(&user(), old, new).await.unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "RENAME COLUMN UNSUPPORTED");
    }
    assert!(migrator.backend().ops().is_empty());
}

#[tokio::test]
async fn test_index_operations_are_no_ops() {
    let migrator = Migrator::new(RecordingBackend::default());
    let entity = user();

    assert!(migrator.has_index(&entity, "idx_users_email").await.unwrap());
    migrator.create_index(&entity, "idx_users_email").await.unwrap();
    migrator.drop_index(&entity, "idx_users_email").await.unwrap();
    migrator
        .rename_index(&entity, "idx_users_email", "idx_users_mail")
        .await
        .unwrap();

    assert!(migrator.backend().ops().is_empty());
}

#[tokio::test]
async fn test_drop_tables_runs_in_reverse_dependency_order() {
    let migrator = Migrator::new(RecordingBackend::default());

    let statements = migrator.drop_tables(&[user(), order()]).await.unwrap();

    assert_eq!(
        statements,
        vec![
            "DROP TABLE IF EXISTS ORDERS".to_string(),
            "DROP TABLE IF EXISTS USERS".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_rename_table_accepts_names_and_entities() {
    let migrator = Migrator::new(RecordingBackend::default());

    let by_entity = migrator.rename_table(&user(), "members").await.unwrap();
    let by_name = migrator.rename_table("members", "people").await.unwrap();

    assert_eq!(by_entity, "ALTER TABLE USERS RENAME TO MEMBERS");
    assert_eq!(by_name, "ALTER TABLE MEMBERS RENAME TO PEOPLE");
}

#[tokio::test]
async fn test_alter_column_redeclares_type_and_nullability() {
    let migrator = Migrator::new(RecordingBackend::default());

    let sql = migrator.alter_column(&user(), "name").await.unwrap();

    assert_eq!(
        sql,
        "ALTER TABLE USERS ALTER COLUMN NAME SET DATA TYPE VARCHAR, COLUMN NAME SET NOT NULL"
    );
}

#[tokio::test]
async fn test_alter_identity_column_is_unsupported() {
    let migrator = Migrator::new(RecordingBackend::default());

    let err = migrator.alter_column(&user(), "id").await.unwrap_err();

    assert!(err.is_unsupported());
}

#[tokio::test]
async fn test_migrate_column_requires_live_column() {
    let backend = RecordingBackend::default().with_table("USERS", vec![live("ID", "NUMBER")]);
    let migrator = Migrator::new(backend);

    let err = migrator.migrate_column(&user(), "email").await.unwrap_err();

    assert!(matches!(err, SchemaError::UnknownField { .. }));
}

#[tokio::test]
async fn test_create_constraint_by_name() {
    let migrator = Migrator::new(RecordingBackend::default());

    let sql = migrator
        .create_constraint(&order(), "chk_orders_total")
        .await
        .unwrap();

    assert_eq!(
        sql,
        "ALTER TABLE ORDERS ADD CONSTRAINT CHK_ORDERS_TOTAL CHECK (TOTAL >= 0)"
    );
}

#[tokio::test]
async fn test_create_unknown_constraint_fails() {
    let migrator = Migrator::new(RecordingBackend::default());

    let err = migrator
        .create_constraint(&order(), "chk_missing")
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaError::UnknownConstraint { .. }));
}

#[tokio::test]
async fn test_drop_constraint_statement() {
    let migrator = Migrator::new(RecordingBackend::default());

    let sql = migrator
        .drop_constraint(&order(), "fk_orders_users_user_id")
        .await
        .unwrap();

    assert_eq!(
        sql,
        "ALTER TABLE ORDERS DROP CONSTRAINT FK_ORDERS_USERS_USER_ID"
    );
}

#[tokio::test]
async fn test_column_types_are_normalized() {
    let backend = RecordingBackend::default().with_table(
        "USERS",
        vec![live("ID", "NUMBER").with_numeric(38, 0), live("NAME", "VARCHAR")],
    );
    let migrator = Migrator::new(backend);

    let columns = migrator.column_types(&user()).await.unwrap();

    let names: Vec<&str> = columns.iter().map(|c| c.database_type_name()).collect();
    assert_eq!(names, vec!["BIGINT", "TEXT"]);
}

#[tokio::test]
async fn test_has_column_resolves_field_names() {
    let backend = RecordingBackend::default().with_table("USERS", vec![live("EMAIL", "TEXT")]);
    let migrator = Migrator::new(backend);

    assert!(migrator.has_column(&user(), "email").await.unwrap());
    assert!(!migrator.has_column(&user(), "name").await.unwrap());
    assert!(migrator.has_table("users").await.unwrap());
    assert_eq!(migrator.current_database().await.unwrap(), "ANALYTICS");
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: MigratorConfig = toml::from_str("table_options = \"DATA_RETENTION_TIME_IN_DAYS = 1\"").unwrap();

    assert!(config.change_tracking);
    assert!(!config.disable_foreign_key_constraints);
    assert_eq!(
        config.table_options.as_deref(),
        Some("DATA_RETENTION_TIME_IN_DAYS = 1")
    );
}
