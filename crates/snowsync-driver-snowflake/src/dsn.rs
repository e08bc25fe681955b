//! DSN parsing
//!
//! `user[:password]@account[/database[/schema]][?warehouse=..&role=..&authenticator=..]`

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use snowsync_core::ConnectionConfig;
use url::Url;

use crate::{DialectorError, DialectorResult, SNOWFLAKE_DRIVER_ID};

/// A parsed connection string
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn {
    pub user: String,
    pub password: Option<String>,
    pub account: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub authenticator: Option<String>,
    /// Any other query parameters, passed through to the transport
    pub params: BTreeMap<String, String>,
}

impl Dsn {
    pub fn parse(dsn: &str) -> DialectorResult<Self> {
        let trimmed = dsn.trim();
        if trimmed.is_empty() {
            return Err(DialectorError::InvalidDsn("DSN is empty".into()));
        }
        let body = trimmed
            .strip_prefix("snowflake://")
            .unwrap_or(trimmed);
        let authority = body.split(['/', '?']).next().unwrap_or_default();
        let Some((userinfo, account)) = authority.rsplit_once('@') else {
            return Err(DialectorError::InvalidDsn(
                "expected user[:password]@account".into(),
            ));
        };
        if account.trim().is_empty() {
            return Err(DialectorError::InvalidAccount("account is required".into()));
        }
        if userinfo.split(':').next().unwrap_or_default().trim().is_empty() {
            return Err(DialectorError::InvalidUser("user is required".into()));
        }

        let url = Url::parse(&format!("snowflake://{}", body))
            .map_err(|e| DialectorError::InvalidDsn(e.to_string()))?;

        let user = decode(url.username())?;
        if user.trim().is_empty() {
            return Err(DialectorError::InvalidUser("user is required".into()));
        }
        let password = url.password().map(decode).transpose()?;

        let account = url.host_str().unwrap_or_default().to_string();
        if account.trim().is_empty() {
            return Err(DialectorError::InvalidAccount("account is required".into()));
        }

        let segments: Vec<String> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect::<DialectorResult<_>>()?;
        if segments.len() > 2 {
            return Err(DialectorError::InvalidDsn(format!(
                "expected at most database/schema in the path, got '{}'",
                url.path()
            )));
        }

        let mut parsed = Self {
            user,
            password,
            account,
            database: segments.first().cloned(),
            schema: segments.get(1).cloned(),
            warehouse: None,
            role: None,
            authenticator: None,
            params: BTreeMap::new(),
        };
        if let Some(port) = url.port() {
            parsed.params.insert("port".into(), port.to_string());
        }

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.to_ascii_lowercase().as_str() {
                "warehouse" => parsed.warehouse = Some(value),
                "role" => parsed.role = Some(value),
                "authenticator" => parsed.authenticator = Some(value),
                "schema" if parsed.schema.is_none() => parsed.schema = Some(value),
                "database" if parsed.database.is_none() => parsed.database = Some(value),
                _ => {
                    parsed.params.insert(key.into_owned(), value);
                }
            }
        }

        Ok(parsed)
    }

    /// Configuration handed to a transport
    pub fn to_connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(SNOWFLAKE_DRIVER_ID, &self.account);
        config.host = self.account.clone();
        config.database = self.database.clone();
        config.username = Some(self.user.clone());
        config.password = self.password.clone();

        for (key, value) in [
            ("schema", &self.schema),
            ("warehouse", &self.warehouse),
            ("role", &self.role),
            ("authenticator", &self.authenticator),
        ] {
            if let Some(value) = value {
                config.params.insert(key.to_string(), value.clone());
            }
        }
        config.params.extend(self.params.clone());
        config
    }

    /// The DSN with the password masked, for logs
    pub fn redacted(&self) -> String {
        let mut copy = self.clone();
        if copy.password.is_some() {
            copy.password = Some("****".into());
        }
        copy.to_string()
    }
}

fn decode(raw: &str) -> DialectorResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| DialectorError::InvalidDsn(e.to_string()))
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode(&self.user))?;
        if let Some(password) = &self.password {
            write!(f, ":{}", encode(password))?;
        }
        write!(f, "@{}", self.account)?;
        if let Some(port) = self.params.get("port") {
            write!(f, ":{}", port)?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{}", encode(database))?;
            if let Some(schema) = &self.schema {
                write!(f, "/{}", encode(schema))?;
            }
        }

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if self.database.is_none() {
            if let Some(schema) = &self.schema {
                query.append_pair("schema", schema);
            }
        }
        for (key, value) in [
            ("warehouse", &self.warehouse),
            ("role", &self.role),
            ("authenticator", &self.authenticator),
        ] {
            if let Some(value) = value {
                query.append_pair(key, value);
            }
        }
        for (key, value) in &self.params {
            if key != "port" {
                query.append_pair(key, value);
            }
        }
        let query = query.finish();
        if !query.is_empty() {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dsn").field(&self.redacted()).finish()
    }
}
