//! Field descriptors and logical types

use serde::{Deserialize, Serialize};

/// Default literal meaning "explicitly no default"
pub const NO_DEFAULT_SENTINEL: &str = "(-)";

/// Abstract field type, independent of the warehouse's type spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogicalType {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
    Bytes,
    /// Caller-declared raw DDL type, passed through unchanged
    Other(String),
}

impl LogicalType {
    pub fn as_str(&self) -> &str {
        match self {
            LogicalType::Bool => "bool",
            LogicalType::Int => "int",
            LogicalType::Uint => "uint",
            LogicalType::Float => "float",
            LogicalType::String => "string",
            LogicalType::Time => "time",
            LogicalType::Bytes => "bytes",
            LogicalType::Other(raw) => raw,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, LogicalType::Int | LogicalType::Uint)
    }
}

impl From<String> for LogicalType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "bool" | "boolean" => LogicalType::Bool,
            "int" | "integer" => LogicalType::Int,
            "uint" => LogicalType::Uint,
            "float" => LogicalType::Float,
            "string" => LogicalType::String,
            "time" => LogicalType::Time,
            "bytes" => LogicalType::Bytes,
            _ => LogicalType::Other(value),
        }
    }
}

impl From<LogicalType> for String {
    fn from(value: LogicalType) -> Self {
        value.as_str().to_string()
    }
}

/// Declared default of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultValue {
    /// Rendered by the type mapper: numbers and booleans bare, a few
    /// symbolic keywords translated, everything else quoted
    Literal(String),
    /// Raw SQL expression emitted as-is
    Expression(String),
}

/// A logical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Source identifier (e.g. `EmailAddress`)
    pub name: String,
    /// Explicit column name, bypassing the naming strategy's conversion
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
    /// Character or byte length; `None` or zero means unbounded
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
    /// Carries an index marker (the warehouse ignores indexes, but the
    /// marker still drives the default string size)
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

fn default_nullable() -> bool {
    true
}

impl FieldDescriptor {
    /// Creates a nullable field with no key, default or size
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            column_name: None,
            logical_type,
            size: None,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            unique: false,
            indexed: false,
            default: None,
        }
    }

    /// Marks the field as (part of) the primary key; implies NOT NULL
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    pub fn with_default_literal(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Literal(literal.into()));
        self
    }

    pub fn with_default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    /// Whether the column is declared NOT NULL; primary keys always are
    pub fn is_required(&self) -> bool {
        !self.nullable || self.primary_key
    }

    /// Declared size, treating zero as absent
    pub fn declared_size(&self) -> Option<u32> {
        self.size.filter(|size| *size > 0)
    }

    /// Whether a default clause will be rendered for this field
    pub fn has_default(&self) -> bool {
        match &self.default {
            Some(DefaultValue::Literal(literal)) => {
                !literal.is_empty() && literal != NO_DEFAULT_SENTINEL
            }
            Some(DefaultValue::Expression(expression)) => !expression.trim().is_empty(),
            None => false,
        }
    }
}
