//! Connectors

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snowsync_core::{Connection, ConnectionConfig, DatabaseDriver};

use crate::{DialectorError, DialectorResult, KeyPairCredential, KeyPairParams, SNOWFLAKE_DRIVER_ID};

/// Something that can open a connection on demand
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> DialectorResult<Arc<dyn Connection>>;
}

/// How a connector authenticates
#[derive(Clone)]
pub enum Authenticator {
    Password(String),
    KeyPair(KeyPairCredential),
}

impl Authenticator {
    /// Value of the transport's `authenticator` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            Authenticator::Password(_) => "SNOWFLAKE",
            Authenticator::KeyPair(_) => "SNOWFLAKE_JWT",
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::Password(_) => f.write_str("Password(<redacted>)"),
            Authenticator::KeyPair(credential) => {
                f.debug_tuple("KeyPair").field(credential).finish()
            }
        }
    }
}

/// Connector that authenticates, then hands the session to a transport
/// driver for the wire protocol
pub struct SnowflakeConnector {
    config: ConnectionConfig,
    authenticator: Authenticator,
    transport: Arc<dyn DatabaseDriver>,
}

impl SnowflakeConnector {
    pub fn new(
        config: ConnectionConfig,
        authenticator: Authenticator,
        transport: Arc<dyn DatabaseDriver>,
    ) -> Self {
        Self {
            config,
            authenticator,
            transport,
        }
    }

    /// Validates `params`, loads the private key and builds a JWT
    /// authenticated connector. Nothing is sent over the network.
    pub fn from_key_pair(
        params: &KeyPairParams,
        transport: Arc<dyn DatabaseDriver>,
    ) -> DialectorResult<Self> {
        let credential = KeyPairCredential::from_params(params)?;

        let mut config = ConnectionConfig::new(SNOWFLAKE_DRIVER_ID, &params.account);
        config.host = params.account.trim().to_string();
        config.username = Some(params.user.trim().to_string());
        config.database = Some(params.database.trim().to_string());
        for (key, value) in [
            ("schema", &params.schema),
            ("warehouse", &params.warehouse),
            ("role", &params.role),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                config.params.insert(key.to_string(), value.to_string());
            }
        }

        Ok(Self::new(
            config,
            Authenticator::KeyPair(credential),
            transport,
        ))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Configuration for one connection attempt at `now`. Key-pair
    /// connectors get a fresh token each time.
    pub fn session_config(&self, now: DateTime<Utc>) -> DialectorResult<ConnectionConfig> {
        let mut config = self.config.clone();
        config
            .params
            .insert("authenticator".into(), self.authenticator.as_param().into());
        match &self.authenticator {
            Authenticator::Password(password) => config.password = Some(password.clone()),
            Authenticator::KeyPair(credential) => {
                config.password = None;
                config.params.insert("token".into(), credential.jwt(now)?);
            }
        }
        Ok(config)
    }
}

#[async_trait]
impl Connector for SnowflakeConnector {
    #[tracing::instrument(skip(self), fields(account = %self.config.host, authenticator = self.authenticator.as_param()))]
    async fn connect(&self) -> DialectorResult<Arc<dyn Connection>> {
        let config = self.session_config(Utc::now())?;
        tracing::debug!(transport = self.transport.name(), "opening connection");
        self.transport
            .connect(&config)
            .await
            .map_err(|e| DialectorError::ConnectionFailed(e.to_string()))
    }
}
