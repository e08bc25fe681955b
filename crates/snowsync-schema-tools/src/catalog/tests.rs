//! Tests for INFORMATION_SCHEMA introspection

use std::sync::Arc;

use snowsync_core::{QueryResult, Value};

use super::*;
use crate::test_support::{MockConnection, column_row, columns_result};
use crate::SchemaError;

#[tokio::test]
async fn test_has_table_queries_uppercased_name() {
    let conn = Arc::new(MockConnection::new().with_count("INFORMATION_SCHEMA.TABLES", "USERS", 1));
    let catalog = InformationSchemaCatalog::new(conn.clone());

    assert!(catalog.has_table("users").await.unwrap());

    let log = conn.query_log();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].0,
        "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = ?"
    );
    assert_eq!(log[0].1, vec![Value::from("USERS")]);
}

#[tokio::test]
async fn test_has_table_false_when_count_is_zero() {
    let conn = Arc::new(MockConnection::new().with_count("INFORMATION_SCHEMA.TABLES", "USERS", 0));
    let catalog = InformationSchemaCatalog::new(conn);

    assert!(!catalog.has_table("USERS").await.unwrap());
}

#[tokio::test]
async fn test_has_column_binds_table_and_column() {
    let conn = Arc::new(MockConnection::new().with_count("INFORMATION_SCHEMA.COLUMNS", "EMAIL", 1));
    let catalog = InformationSchemaCatalog::new(conn.clone());

    assert!(catalog.has_column("users", "email").await.unwrap());

    let (sql, params) = &conn.query_log()[0];
    assert_eq!(
        sql,
        "SELECT COUNT(*) FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = ? AND COLUMN_NAME = ?"
    );
    assert_eq!(params, &vec![Value::from("USERS"), Value::from("EMAIL")]);
}

#[tokio::test]
async fn test_has_constraint_strips_quotes() {
    let conn = Arc::new(MockConnection::new());
    let catalog = InformationSchemaCatalog::new(conn.clone());

    assert!(!catalog.has_constraint("\"orders\"", "fk_orders_users_user_id").await.unwrap());

    let (sql, params) = &conn.query_log()[0];
    assert!(sql.contains("INFORMATION_SCHEMA.TABLE_CONSTRAINTS WHERE CONSTRAINT_NAME = ? AND TABLE_NAME = ?"));
    assert_eq!(
        params,
        &vec![Value::from("FK_ORDERS_USERS_USER_ID"), Value::from("ORDERS")]
    );
}

#[tokio::test]
async fn test_schema_filter_is_appended() {
    let conn = Arc::new(MockConnection::new());
    let catalog = InformationSchemaCatalog::new(conn.clone()).with_schema("analytics");

    catalog.has_table("users").await.unwrap();
    catalog.column_types("users").await.unwrap();

    let log = conn.query_log();
    assert!(log[0].0.ends_with("WHERE TABLE_NAME = ? AND TABLE_SCHEMA = ?"));
    assert_eq!(log[0].1, vec![Value::from("USERS"), Value::from("ANALYTICS")]);
    assert!(log[1].0.ends_with("AND TABLE_SCHEMA = ? ORDER BY ORDINAL_POSITION"));
}

#[tokio::test]
async fn test_column_types_parses_catalog_rows() {
    let mut identity = column_row("ID", "NUMBER", None, Some((38, 0)), false);
    identity[7] = Value::from("YES");
    let conn = Arc::new(MockConnection::new().with_query_response(
        "FROM INFORMATION_SCHEMA.COLUMNS",
        columns_result(vec![
            identity,
            column_row("NAME", "TEXT", Some(16_777_216), None, true),
            column_row("PRICE", "NUMBER", None, Some((10, 2)), true),
        ]),
    ));
    let catalog = InformationSchemaCatalog::new(conn);

    let columns = catalog.column_types("products").await.unwrap();

    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].name(), "ID");
    assert_eq!(columns[0].auto_increment(), Some(true));
    assert_eq!(columns[0].nullable(), Some(false));
    assert_eq!(columns[0].decimal_size(), Some((38, 0)));
    assert_eq!(columns[1].database_type_name(), "TEXT");
    assert_eq!(columns[1].length(), Some(16_777_216));
    assert_eq!(columns[1].default_value(), None);
    assert_eq!(columns[2].decimal_size(), Some((10, 2)));
    assert_eq!(columns[2].primary_key(), None);
}

#[tokio::test]
async fn test_introspection_failure_names_table() {
    let conn = Arc::new(MockConnection::new().with_query_failure());
    let catalog = InformationSchemaCatalog::new(conn);

    match catalog.column_types("users").await {
        Err(SchemaError::Introspection { table, .. }) => assert_eq!(table, "users"),
        other => panic!("expected introspection error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_current_database() {
    let conn = Arc::new(MockConnection::new().with_query_response(
        "CURRENT_DATABASE()",
        QueryResult::from_rows(&["CURRENT_DATABASE()"], vec![vec![Value::from("ANALYTICS")]]),
    ));
    let catalog = InformationSchemaCatalog::new(conn);

    assert_eq!(catalog.current_database().await.unwrap(), "ANALYTICS");
}

#[tokio::test]
async fn test_unparseable_count_is_an_introspection_error() {
    let conn = Arc::new(MockConnection::new().with_query_response(
        "INFORMATION_SCHEMA.TABLES",
        QueryResult::from_rows(&["COUNT(*)"], vec![vec![Value::from("not-a-number")]]),
    ));
    let catalog = InformationSchemaCatalog::new(conn);

    match catalog.has_table("users").await {
        Err(SchemaError::Introspection { .. }) => {}
        other => panic!("expected introspection error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_count_row_is_an_introspection_error() {
    let conn = Arc::new(MockConnection::new().with_query_response(
        "INFORMATION_SCHEMA.COLUMNS",
        QueryResult::empty(),
    ));
    let catalog = InformationSchemaCatalog::new(conn);

    assert!(matches!(
        catalog.has_column("users", "email").await,
        Err(SchemaError::Introspection { .. })
    ));
}

#[tokio::test]
async fn test_current_database_requires_an_answer() {
    let conn = Arc::new(MockConnection::new().with_query_response(
        "CURRENT_DATABASE()",
        QueryResult::from_rows(&["CURRENT_DATABASE()"], vec![vec![Value::Null]]),
    ));
    let catalog = InformationSchemaCatalog::new(conn);

    match catalog.current_database().await {
        Err(SchemaError::Introspection { table, .. }) => assert_eq!(table, "CURRENT_DATABASE()"),
        other => panic!("expected introspection error, got {:?}", other),
    }
}
