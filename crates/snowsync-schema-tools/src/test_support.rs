//! Test doubles shared by the unit tests

use std::sync::Arc;

use async_trait::async_trait;
use snowsync_core::{
    Connection, CoreError, QueryResult, Result, StatementResult, Transaction, Value,
};

use crate::model::{
    CheckConstraintDescriptor, EntityDescriptor, FieldDescriptor, LogicalType,
    RelationshipDescriptor,
};

/// Mock connection that records every statement and answers queries by
/// SQL pattern.
pub struct MockConnection {
    /// SQL-pattern-based responses, optionally restricted to queries bound
    /// to a given string parameter. The first match wins.
    pub query_responses: Vec<(String, Option<String>, QueryResult)>,
    /// Statements that fail when executed, by pattern
    pub failing_statements: Vec<String>,
    pub should_fail_queries: bool,
    pub query_log: Arc<parking_lot::Mutex<Vec<(String, Vec<Value>)>>>,
    pub execute_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            query_responses: Vec::new(),
            failing_statements: Vec::new(),
            should_fail_queries: false,
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            execute_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_query_response(mut self, sql_contains: impl Into<String>, result: QueryResult) -> Self {
        self.query_responses.push((sql_contains.into(), None, result));
        self
    }

    /// Register a response for queries containing the pattern and bound to
    /// `param` (typically a table name).
    pub fn with_param_response(
        mut self,
        sql_contains: impl Into<String>,
        param: impl Into<String>,
        result: QueryResult,
    ) -> Self {
        self.query_responses
            .push((sql_contains.into(), Some(param.into()), result));
        self
    }

    /// Answers `SELECT COUNT(*)` lookups for `param` with `count`
    pub fn with_count(self, sql_contains: impl Into<String>, param: impl Into<String>, count: i64) -> Self {
        self.with_param_response(sql_contains, param, count_result(count))
    }

    pub fn with_failing_statement(mut self, sql_contains: impl Into<String>) -> Self {
        self.failing_statements.push(sql_contains.into());
        self
    }

    pub fn with_query_failure(mut self) -> Self {
        self.should_fail_queries = true;
        self
    }

    pub fn query_log(&self) -> Vec<(String, Vec<Value>)> {
        self.query_log.lock().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.execute_log.lock().clone()
    }
}

pub fn count_result(count: i64) -> QueryResult {
    QueryResult::from_rows(&["COUNT(*)"], vec![vec![Value::Int64(count)]])
}

/// Rows shaped like the catalog's column query
pub fn columns_result(rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::from_rows(
        &[
            "COLUMN_NAME",
            "DATA_TYPE",
            "CHARACTER_MAXIMUM_LENGTH",
            "NUMERIC_PRECISION",
            "NUMERIC_SCALE",
            "IS_NULLABLE",
            "COLUMN_DEFAULT",
            "IS_IDENTITY",
            "COMMENT",
        ],
        rows,
    )
}

/// `User`: identity key, a required name and a unique email
pub fn user() -> EntityDescriptor {
    EntityDescriptor::new("User")
        .with_field(
            FieldDescriptor::new("id", LogicalType::Int)
                .primary_key()
                .auto_increment(),
        )
        .with_field(FieldDescriptor::new("name", LogicalType::String).not_null())
        .with_field(FieldDescriptor::new("email", LogicalType::String).unique())
}

/// `Order`: references `User` and checks its total
pub fn order() -> EntityDescriptor {
    EntityDescriptor::new("Order")
        .with_field(FieldDescriptor::new("id", LogicalType::Int).primary_key())
        .with_field(FieldDescriptor::new("user_id", LogicalType::Int).not_null())
        .with_field(FieldDescriptor::new("total", LogicalType::Float))
        .with_relationship(RelationshipDescriptor::new(["user_id"], "User", ["id"]))
        .with_check(CheckConstraintDescriptor::on_field("total", "TOTAL >= 0"))
}

/// One catalog column row
pub fn column_row(
    name: &str,
    data_type: &str,
    length: Option<i64>,
    precision_scale: Option<(i64, i64)>,
    nullable: bool,
) -> Vec<Value> {
    vec![
        Value::from(name),
        Value::from(data_type),
        length.map(Value::Int64).unwrap_or(Value::Null),
        precision_scale
            .map(|(p, _)| Value::Decimal(p.to_string()))
            .unwrap_or(Value::Null),
        precision_scale
            .map(|(_, s)| Value::Decimal(s.to_string()))
            .unwrap_or(Value::Null),
        Value::from(if nullable { "YES" } else { "NO" }),
        Value::Null,
        Value::from("NO"),
        Value::Null,
    ]
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.execute_log.lock().push(sql.to_string());
        if self.failing_statements.iter().any(|p| sql.contains(p.as_str())) {
            return Err(CoreError::Query(format!("statement rejected: {}", sql)));
        }
        Ok(StatementResult::command())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.query_log.lock().push((sql.to_string(), params.to_vec()));

        if self.should_fail_queries {
            return Err(CoreError::Query("Query failed".into()));
        }

        for (pattern, param, result) in &self.query_responses {
            let bound = param
                .as_deref()
                .is_none_or(|p| params.iter().any(|v| v.as_str() == Some(p)));
            if sql.contains(pattern.as_str()) && bound {
                return Ok(result.clone());
            }
        }

        // An empty table or constraint lookup still answers with a count.
        if sql.contains("COUNT(*)") {
            return Ok(count_result(0));
        }
        Ok(QueryResult::empty())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        Err(CoreError::NotSupported(
            "Transactions not implemented in mock".into(),
        ))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}
