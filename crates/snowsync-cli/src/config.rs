//! `snowsync.toml`
//!
//! ```toml
//! [connection]
//! account = "xy12345.us-east-1"
//! user = "loader"
//! database = "ANALYTICS"
//! private_key_path = "keys/loader.p8"
//!
//! [migrator]
//! schema = "PUBLIC"
//! change_tracking = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use snowsync_driver_snowflake::{Dsn, KeyPairCredential, KeyPairParams};
use snowsync_schema_tools::MigratorConfig;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "snowsync.toml";

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub connection: ConnectionSettings,
    pub migrator: MigratorConfig,
}

impl CliConfig {
    /// Reads `path`. Relative key paths are resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: CliConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        if let Some(key_path) = config.connection.private_key_path.take() {
            let resolved = match path.parent() {
                Some(dir) if key_path.is_relative() => dir.join(key_path),
                _ => key_path,
            };
            config.connection.private_key_path = Some(resolved);
        }

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Loads `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// The `[connection]` section. Either a `dsn`, or the individual fields
/// with a `password` or a `private_key_path`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSettings {
    pub dsn: Option<String>,
    pub account: Option<String>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("dsn", &self.dsn.as_deref().map(redact_dsn))
            .field("account", &self.account)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .finish()
    }
}

fn redact_dsn(dsn: &str) -> String {
    Dsn::parse(dsn)
        .map(|parsed| parsed.redacted())
        .unwrap_or_else(|_| "<invalid>".to_string())
}

/// How the configured connection would authenticate
#[derive(Debug)]
pub enum ConnectionCheck {
    Dsn(Dsn),
    Password { account: String, user: String },
    KeyPair(KeyPairCredential),
}

impl ConnectionSettings {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Key-pair parameters, reading the private key from disk
    pub fn key_pair_params(&self) -> anyhow::Result<KeyPairParams> {
        let Some(key_path) = &self.private_key_path else {
            bail!("no private_key_path configured");
        };
        let pem = std::fs::read_to_string(key_path)
            .with_context(|| format!("failed to read private key {}", key_path.display()))?;

        let mut params = KeyPairParams::new(
            self.account.clone().unwrap_or_default(),
            self.user.clone().unwrap_or_default(),
            pem,
            self.database.clone().unwrap_or_default(),
        );
        params.schema = self.schema.clone();
        params.warehouse = self.warehouse.clone();
        params.role = self.role.clone();
        Ok(params)
    }

    /// Validates the settings offline: parses the DSN, or loads and checks
    /// the private key. Nothing is sent over the network.
    pub fn check(&self) -> anyhow::Result<ConnectionCheck> {
        if let Some(dsn) = &self.dsn {
            let parsed = Dsn::parse(dsn).context("invalid dsn")?;
            return Ok(ConnectionCheck::Dsn(parsed));
        }
        if self.private_key_path.is_some() {
            let params = self.key_pair_params()?;
            let credential =
                KeyPairCredential::from_params(&params).context("invalid key-pair settings")?;
            return Ok(ConnectionCheck::KeyPair(credential));
        }
        if self.password.is_some() {
            let account = required(&self.account, "account")?;
            let user = required(&self.user, "user")?;
            return Ok(ConnectionCheck::Password { account, user });
        }
        bail!("no connection configured: set dsn, password or private_key_path")
    }
}

fn required(value: &Option<String>, name: &str) -> anyhow::Result<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => bail!("{} is required", name),
    }
}
