//! Dialector

use std::sync::Arc;

use snowsync_core::{Connection, DatabaseDriver, DriverCapabilities, Value};
use snowsync_schema_tools::{LiveBackend, MAX_IDENTIFIER_LENGTH, Migrator, MigratorConfig};

use crate::{Connector, DialectorError, DialectorResult, Dsn, KeyPairParams, SnowflakeConnector};

/// Driver id used in connection configs
pub const SNOWFLAKE_DRIVER_ID: &str = "snowflake";

/// Where connections come from
#[derive(Clone)]
pub enum ConnectionSource {
    /// An externally managed, already-open pool handle
    Pool(Arc<dyn Connection>),
    Connector(Arc<dyn Connector>),
    Dsn(String),
}

impl ConnectionSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionSource::Pool(_) => "pool",
            ConnectionSource::Connector(_) => "connector",
            ConnectionSource::Dsn(_) => "dsn",
        }
    }
}

/// Dialector configuration
#[derive(Clone, Default)]
pub struct DialectorConfig {
    pub dsn: Option<String>,
    pub connector: Option<Arc<dyn Connector>>,
    pub pool: Option<Arc<dyn Connection>>,
    /// Opens DSN connections
    pub transport: Option<Arc<dyn DatabaseDriver>>,
    pub migrator: MigratorConfig,
}

impl DialectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn Connection>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn DatabaseDriver>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_migrator(mut self, migrator: MigratorConfig) -> Self {
        self.migrator = migrator;
        self
    }
}

/// Entry point tying a connection source to the schema migrator
#[derive(Clone)]
pub struct Dialector {
    config: DialectorConfig,
}

impl Dialector {
    pub fn new(config: DialectorConfig) -> Self {
        Self { config }
    }

    /// Dialector over a DSN; a transport must be supplied before
    /// [`Dialector::initialize`]
    pub fn open(dsn: impl Into<String>) -> Self {
        Self::new(DialectorConfig::new().with_dsn(dsn))
    }

    /// Dialector with a key-pair authenticated connector. Parameters and the
    /// key are validated here, before any I/O.
    pub fn open_with_key(
        params: KeyPairParams,
        transport: Arc<dyn DatabaseDriver>,
    ) -> DialectorResult<Self> {
        let connector = SnowflakeConnector::from_key_pair(&params, transport.clone())?;
        Ok(Self::new(
            DialectorConfig::new()
                .with_connector(Arc::new(connector))
                .with_transport(transport),
        ))
    }

    pub fn with_transport(mut self, transport: Arc<dyn DatabaseDriver>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn with_migrator_config(mut self, migrator: MigratorConfig) -> Self {
        self.config.migrator = migrator;
        self
    }

    pub fn config(&self) -> &DialectorConfig {
        &self.config
    }

    pub fn name(&self) -> &'static str {
        SNOWFLAKE_DRIVER_ID
    }

    /// The source [`Dialector::initialize`] will use: a pool first, then a
    /// connector, then a non-blank DSN
    pub fn source(&self) -> DialectorResult<ConnectionSource> {
        if let Some(pool) = &self.config.pool {
            return Ok(ConnectionSource::Pool(pool.clone()));
        }
        if let Some(connector) = &self.config.connector {
            return Ok(ConnectionSource::Connector(connector.clone()));
        }
        match self.config.dsn.as_deref().map(str::trim) {
            Some(dsn) if !dsn.is_empty() => Ok(ConnectionSource::Dsn(dsn.to_string())),
            _ => Err(DialectorError::NoConnectionSource),
        }
    }

    /// Opens (or borrows) the connection the migrator will run on
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> DialectorResult<Arc<dyn Connection>> {
        let source = self.source()?;
        tracing::debug!(source = source.kind(), "initializing dialector");

        match source {
            ConnectionSource::Pool(pool) => Ok(pool),
            ConnectionSource::Connector(connector) => connector.connect().await,
            ConnectionSource::Dsn(dsn) => {
                let parsed = Dsn::parse(&dsn)?;
                let transport = self.config.transport.as_ref().ok_or_else(|| {
                    DialectorError::ConnectionFailed(
                        "a DSN was given but no transport is configured".into(),
                    )
                })?;
                tracing::debug!(dsn = %parsed.redacted(), "opening DSN connection");
                transport
                    .connect(&parsed.to_connection_config())
                    .await
                    .map_err(|e| DialectorError::ConnectionFailed(e.to_string()))
            }
        }
    }

    /// Migrator over `connection` using the warehouse naming policy
    pub fn migrator(&self, connection: Arc<dyn Connection>) -> Migrator<LiveBackend> {
        Migrator::live(connection, self.config.migrator.clone())
    }

    pub async fn open_migrator(&self) -> DialectorResult<Migrator<LiveBackend>> {
        let connection = self.initialize().await?;
        Ok(self.migrator(connection))
    }

    pub fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            supports_transactions: true,
            supports_savepoints: false,
            supports_returning: false,
            supports_indexes: false,
            supports_schemas: true,
            supports_cancellation: true,
            supports_foreign_keys: true,
            enforces_foreign_keys: false,
            max_identifier_length: Some(MAX_IDENTIFIER_LENGTH),
        }
    }

    /// Identifiers are folded to uppercase rather than quoted
    pub fn quote(&self, identifier: &str) -> String {
        identifier.to_uppercase()
    }

    pub fn bind_var(&self) -> char {
        '?'
    }

    /// `sql` with each `?` placeholder replaced by its rendered parameter,
    /// for logs
    pub fn explain(&self, sql: &str, params: &[Value]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut params = params.iter();
        let mut in_string = false;
        for c in sql.chars() {
            match c {
                '\'' => {
                    in_string = !in_string;
                    out.push(c);
                }
                '?' if !in_string => match params.next() {
                    Some(value) => out.push_str(&render_literal(value)),
                    None => out.push(c),
                },
                _ => out.push(c),
            }
        }
        out
    }
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string().to_uppercase(),
        Value::Int32(_) | Value::Int64(_) | Value::Float64(_) | Value::Decimal(_) => {
            value.to_string()
        }
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
