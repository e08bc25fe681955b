//! Errors raised while describing, introspecting or migrating a schema

use snowsync_core::CoreError;
use thiserror::Error;

/// Errors that can occur during schema synchronization
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Entity description is unusable as given
    #[error("invalid entity '{entity}': {reason}")]
    InvalidEntity { entity: String, reason: String },

    /// Two fields normalize to the same column name
    #[error("entity '{entity}' declares column '{column}' more than once")]
    DuplicateField { entity: String, column: String },

    /// Relationship field lists are empty or of unequal length
    #[error("invalid relationship on '{entity}': {reason}")]
    InvalidRelationship { entity: String, reason: String },

    /// A field lookup by name failed
    #[error("entity '{entity}' has no field named '{field}'")]
    UnknownField { entity: String, field: String },

    /// A constraint lookup by name failed
    #[error("table '{table}' declares no constraint named '{name}'")]
    UnknownConstraint { table: String, name: String },

    /// The relationship graph has no valid creation order
    #[error("dependency cycle between entities: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A live-metadata query failed
    #[error("failed to introspect table '{table}': {source}")]
    Introspection {
        table: String,
        #[source]
        source: CoreError,
    },

    /// A DDL statement failed
    #[error("failed to execute DDL on '{table}': {statement}: {source}")]
    Ddl {
        table: String,
        statement: String,
        #[source]
        source: CoreError,
    },

    /// The warehouse has no equivalent for the requested operation
    #[error("{0} UNSUPPORTED")]
    Unsupported(String),
}

impl SchemaError {
    pub(crate) fn introspection(table: impl Into<String>, source: CoreError) -> Self {
        SchemaError::Introspection {
            table: table.into(),
            source,
        }
    }

    pub(crate) fn ddl(table: impl Into<String>, statement: impl Into<String>, source: CoreError) -> Self {
        SchemaError::Ddl {
            table: table.into(),
            statement: statement.into(),
            source,
        }
    }

    /// Whether this is the explicit unsupported-operation condition
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SchemaError::Unsupported(_))
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
