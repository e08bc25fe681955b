//! Logical type to DDL type

use crate::model::{DefaultValue, FieldDescriptor, LogicalType, NO_DEFAULT_SENTINEL};

/// Size given to keyed strings that declare none
pub const DEFAULT_KEYED_STRING_SIZE: u32 = 256;

/// Largest size rendered as a bounded `VARCHAR(n)`
pub const MAX_BOUNDED_VARCHAR_SIZE: u32 = 4000;

/// Identity column clause
pub const IDENTITY_CLAUSE: &str = "IDENTITY(1,1)";

/// Size a string field is declared with, or `None` for unbounded VARCHAR
pub fn effective_string_size(field: &FieldDescriptor) -> Option<u32> {
    let keyed = field.primary_key || field.indexed || field.unique;
    let size = match field.declared_size() {
        Some(size) => size,
        None if keyed => DEFAULT_KEYED_STRING_SIZE,
        None => return None,
    };
    (size <= MAX_BOUNDED_VARCHAR_SIZE).then_some(size)
}

/// DDL type of a field, without nullability or default
pub fn ddl_type_of(field: &FieldDescriptor) -> String {
    match &field.logical_type {
        LogicalType::Bool => "BOOLEAN".to_string(),
        LogicalType::Int | LogicalType::Uint => {
            if field.auto_increment {
                format!("BIGINT {}", IDENTITY_CLAUSE)
            } else {
                "BIGINT".to_string()
            }
        }
        LogicalType::Float => "FLOAT".to_string(),
        LogicalType::String => match effective_string_size(field) {
            Some(size) => format!("VARCHAR({})", size),
            None => "VARCHAR".to_string(),
        },
        LogicalType::Time => "TIMESTAMP_NTZ".to_string(),
        LogicalType::Bytes => "VARBINARY".to_string(),
        LogicalType::Other(raw) => raw.clone(),
    }
}

/// How a declared default is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedDefault {
    /// `DEFAULT <sql>`
    Value(String),
    /// Identity generation, rendered as a column attribute
    Identity,
}

/// Renders a default literal.
///
/// `CURRENT_TIMESTAMP` and `NULL` map to keywords, `IDENTITY` and
/// `AUTOINCREMENT` to identity generation, booleans are uppercased and
/// numbers pass through. Anything else becomes a quoted string literal.
pub fn render_default_literal(literal: &str) -> RenderedDefault {
    let trimmed = literal.trim();
    let upper = trimmed.to_uppercase();
    match upper.as_str() {
        "CURRENT_TIMESTAMP" | "CURRENT_TIMESTAMP()" => {
            RenderedDefault::Value("CURRENT_TIMESTAMP".to_string())
        }
        "IDENTITY" | "AUTOINCREMENT" => RenderedDefault::Identity,
        "NULL" => RenderedDefault::Value("NULL".to_string()),
        "TRUE" | "FALSE" => RenderedDefault::Value(upper),
        _ if is_numeric_literal(trimmed) => RenderedDefault::Value(trimmed.to_string()),
        _ => RenderedDefault::Value(format!("'{}'", literal.replace('\'', "''"))),
    }
}

fn is_numeric_literal(text: &str) -> bool {
    // `f64::from_str` also accepts "inf" and "NaN", which are not SQL numbers.
    text.chars().any(|c| c.is_ascii_digit())
        && text.parse::<f64>().is_ok_and(|value| value.is_finite())
}

/// Rendered default of a field, if one applies
pub fn default_of(field: &FieldDescriptor) -> Option<RenderedDefault> {
    if !field.has_default() {
        return None;
    }
    match field.default.as_ref()? {
        DefaultValue::Literal(literal) if literal != NO_DEFAULT_SENTINEL => {
            Some(render_default_literal(literal))
        }
        DefaultValue::Literal(_) => None,
        DefaultValue::Expression(expression) => {
            Some(RenderedDefault::Value(expression.trim().to_string()))
        }
    }
}

/// Full column definition fragment: type, identity, `NOT NULL`, `UNIQUE`
/// and `DEFAULT`, in that order
pub fn full_data_type_of(field: &FieldDescriptor) -> String {
    let mut sql = ddl_type_of(field);
    let default = default_of(field);

    if default == Some(RenderedDefault::Identity) && !declares_identity(&sql) {
        sql.push(' ');
        sql.push_str(IDENTITY_CLAUSE);
    }

    if field.is_required() {
        sql.push_str(" NOT NULL");
    }

    if field.unique {
        sql.push_str(" UNIQUE");
    }

    if let Some(RenderedDefault::Value(value)) = default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&value);
    }

    sql
}

/// Whether a DDL type already carries identity generation
pub fn declares_identity(ddl_type: &str) -> bool {
    let upper = ddl_type.to_uppercase();
    upper.contains("IDENTITY") || upper.contains("AUTOINCREMENT")
}
