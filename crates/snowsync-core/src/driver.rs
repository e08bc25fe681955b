//! Database driver trait definition

use crate::{Connection, CoreError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Capabilities that a driver may support
#[derive(Debug, Clone, Default)]
pub struct DriverCapabilities {
    /// Supports transactions
    pub supports_transactions: bool,
    /// Supports savepoints
    pub supports_savepoints: bool,
    /// Supports RETURNING clause
    pub supports_returning: bool,
    /// Supports secondary indexes
    pub supports_indexes: bool,
    /// Supports schemas (namespaces)
    pub supports_schemas: bool,
    /// Supports query cancellation
    pub supports_cancellation: bool,
    /// Supports declaring foreign keys
    pub supports_foreign_keys: bool,
    /// Foreign keys are checked on write
    pub enforces_foreign_keys: bool,
    /// Maximum identifier length (None = no limit)
    pub max_identifier_length: Option<usize>,
}

/// Transport that opens connections to a warehouse
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "snowflake")
    fn id(&self) -> &'static str {
        self.name()
    }

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Supported features/capabilities
    fn capabilities(&self) -> DriverCapabilities;

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Test connection without fully connecting
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()>;

    /// Parse a connection string into a configuration
    fn parse_connection_string(&self, _conn_str: &str) -> Result<ConnectionConfig> {
        Err(CoreError::NotSupported(
            "Connection string parsing not implemented for this driver".into(),
        ))
    }

    /// Build a connection string from configuration
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;
}

/// Connection configuration handed to a transport
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Unique identifier
    pub id: uuid::Uuid,
    /// Display name
    pub name: String,
    /// Driver ID (e.g., "snowflake")
    pub driver: String,
    /// Host address (the account locator for hosted warehouses)
    pub host: String,
    /// Port number (0 for default)
    pub port: u16,
    /// Database name
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters (schema, warehouse, role, token, ...)
    pub params: HashMap<String, String>,
    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str, name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            driver: driver.to_string(),
            host: String::new(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let val = value.into();
        let str_val = match val {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        self.params.insert(key.to_string(), str_val);
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" | "account" => Some(self.host.clone()),
            "database" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Get port
    pub fn get_port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_string_prefers_params() {
        let mut config = ConnectionConfig::new("snowflake", "test").with_param("role", "SYSADMIN");
        config.host = "xy12345".into();
        config.username = Some("loader".into());

        assert_eq!(config.get_string("role").as_deref(), Some("SYSADMIN"));
        assert_eq!(config.get_string("account").as_deref(), Some("xy12345"));
        assert_eq!(config.get_string("user").as_deref(), Some("loader"));
        assert!(config.get_string("warehouse").is_none());
    }

    #[test]
    fn test_with_param_stringifies_values() {
        let config = ConnectionConfig::new("snowflake", "test").with_param("login_timeout", 30);
        assert_eq!(config.params.get("login_timeout").map(String::as_str), Some("30"));
    }
}
