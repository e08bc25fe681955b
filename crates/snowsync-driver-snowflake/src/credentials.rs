//! Key-pair credentials
//!
//! The warehouse authenticates key-pair users with a short-lived RS256 JWT
//! whose issuer embeds the SHA-256 fingerprint of the user's registered
//! public key.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use ring::rand::SystemRandom;
use ring::signature::{self, KeyPair, RsaKeyPair};
use ring::{digest, error::KeyRejected};
use serde::Serialize;

use crate::der;
use crate::{DialectorError, DialectorResult};

/// Smallest RSA modulus accepted for key-pair authentication
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Default lifetime of a generated token
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 60;

const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// Parameters for opening a key-pair authenticated connection
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyPairParams {
    pub account: String,
    pub user: String,
    pub private_key_pem: String,
    pub database: String,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
}

impl KeyPairParams {
    pub fn new(
        account: impl Into<String>,
        user: impl Into<String>,
        private_key_pem: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
            private_key_pem: private_key_pem.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Rejects empty and whitespace-only required parameters, in the order
    /// account, user, private key, database
    pub fn validate(&self) -> DialectorResult<()> {
        require(&self.account, "account", DialectorError::InvalidAccount)?;
        require(&self.user, "user", DialectorError::InvalidUser)?;
        require(
            &self.private_key_pem,
            "private key",
            DialectorError::EmptyPrivateKey,
        )?;
        require(&self.database, "database", DialectorError::InvalidDatabase)?;
        Ok(())
    }
}

impl fmt::Debug for KeyPairParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairParams")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("private_key_pem", &"<redacted>")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

fn require(
    value: &str,
    name: &str,
    error: fn(String) -> DialectorError,
) -> DialectorResult<()> {
    if value.is_empty() {
        return Err(error(format!("{} is required", name)));
    }
    if value.trim().is_empty() {
        return Err(error(format!("{} cannot be only whitespace", name)));
    }
    Ok(())
}

/// One decoded PEM block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemBlock {
    pub label: String,
    pub der: Vec<u8>,
}

/// Decodes the first PEM block in `pem`. Only the private key labels are
/// accepted.
pub fn parse_pem_block(pem: &str) -> DialectorResult<PemBlock> {
    let trimmed = pem.trim();
    if trimmed.is_empty() {
        return Err(DialectorError::EmptyPrivateKey(
            "private key string is empty after trimming whitespace".into(),
        ));
    }
    if !trimmed.contains("-----BEGIN") || !trimmed.contains("-----END") {
        return Err(DialectorError::MalformedPemBlock(
            "missing PEM header or footer markers".into(),
        ));
    }

    let mut lines = trimmed.lines().map(str::trim);
    let label = lines
        .by_ref()
        .find_map(|line| {
            line.strip_prefix("-----BEGIN ")
                .and_then(|rest| rest.strip_suffix("-----"))
        })
        .ok_or_else(|| DialectorError::MalformedPemBlock("no valid PEM block found in input".into()))?
        .to_string();

    let footer = format!("-----END {}-----", label);
    let mut body = String::new();
    let mut closed = false;
    for line in lines {
        if line == footer {
            closed = true;
            break;
        }
        // Encapsulated headers (`Proc-Type: ...`) are not part of the body
        if line.contains(':') || line.is_empty() {
            continue;
        }
        body.push_str(line);
    }
    if !closed {
        return Err(DialectorError::MalformedPemBlock(format!(
            "no footer matching '{}'",
            label
        )));
    }

    let der = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| DialectorError::MalformedPemBlock(format!("invalid base64 body: {}", e)))?;

    if label != PKCS8_LABEL && label != PKCS1_LABEL {
        return Err(DialectorError::InvalidPemBlockType(label));
    }
    if der.is_empty() {
        return Err(DialectorError::MalformedPemBlock(
            "PEM block contains no data".into(),
        ));
    }

    Ok(PemBlock { label, der })
}

/// A validated RSA private key of at least [`MIN_RSA_KEY_BITS`] bits
pub struct RsaPrivateKey {
    key_pair: RsaKeyPair,
    bits: usize,
}

impl RsaPrivateKey {
    /// Parses a PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM
    pub fn from_pem(pem: &str) -> DialectorResult<Self> {
        let block = parse_pem_block(pem)?;
        let pkcs8 = block.label == PKCS8_LABEL;

        let key_pair = if pkcs8 {
            RsaKeyPair::from_pkcs8(&block.der)
        } else {
            RsaKeyPair::from_der(&block.der)
        }
        .map_err(|rejected| classify_rejection(rejected, &block.der, pkcs8))?;

        let bits = key_pair.public().modulus_len() * 8;
        if bits < MIN_RSA_KEY_BITS {
            return Err(DialectorError::KeyTooSmall { bits });
        }

        tracing::debug!(bits, format = %block.label, "loaded RSA private key");
        Ok(Self { key_pair, bits })
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// DER `RSAPublicKey` (PKCS#1)
    pub fn public_key_der(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    /// `SHA256:<base64>` over the DER `SubjectPublicKeyInfo`, the form the
    /// warehouse stores for a registered public key
    pub fn fingerprint(&self) -> String {
        let spki = der::rsa_subject_public_key_info(self.public_key_der());
        let hash = digest::digest(&digest::SHA256, &spki);
        format!("SHA256:{}", STANDARD.encode(hash.as_ref()))
    }

    /// RSASSA-PKCS1-v1_5 SHA-256 signature
    pub fn sign(&self, message: &[u8]) -> DialectorResult<Vec<u8>> {
        let rng = SystemRandom::new();
        let mut signature = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&signature::RSA_PKCS1_SHA256, &rng, message, &mut signature)
            .map_err(|_| DialectorError::Signing("RSA signing failed".into()))?;
        Ok(signature)
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

fn classify_rejection(rejected: KeyRejected, der_bytes: &[u8], pkcs8: bool) -> DialectorError {
    match rejected.to_string().as_str() {
        "WrongAlgorithm" => DialectorError::UnsupportedKeyType,
        "TooSmall" => DialectorError::KeyTooSmall {
            bits: der::rsa_modulus_bits(der_bytes, pkcs8).unwrap_or(0),
        },
        "InvalidEncoding" | "VersionNotSupported" => {
            let format = if pkcs8 { "PKCS#8" } else { "PKCS#1" };
            DialectorError::KeyParsingFailed(format!(
                "failed to parse {} private key: {}",
                format, rejected
            ))
        }
        other => DialectorError::KeyValidationFailed(format!(
            "RSA key structure validation failed: {}",
            other
        )),
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Debug, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Account, user and key for key-pair authentication
#[derive(Clone)]
pub struct KeyPairCredential {
    account: String,
    user: String,
    key: Arc<RsaPrivateKey>,
    fingerprint: String,
    lifetime: Duration,
}

impl KeyPairCredential {
    pub fn new(account: &str, user: &str, key: RsaPrivateKey) -> Self {
        let fingerprint = key.fingerprint();
        Self {
            account: token_account(account),
            user: user.trim().to_uppercase(),
            key: Arc::new(key),
            fingerprint,
            lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }

    /// Validates the parameters and loads the key
    pub fn from_params(params: &KeyPairParams) -> DialectorResult<Self> {
        params.validate()?;
        let key = RsaPrivateKey::from_pem(&params.private_key_pem)?;
        Ok(Self::new(&params.account, &params.user, key))
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// `ACCOUNT.USER`
    pub fn subject(&self) -> String {
        format!("{}.{}", self.account, self.user)
    }

    /// `ACCOUNT.USER.SHA256:<fingerprint>`
    pub fn issuer(&self) -> String {
        format!("{}.{}", self.subject(), self.fingerprint)
    }

    pub fn claims(&self, now: DateTime<Utc>) -> JwtClaims {
        let iat = now.timestamp();
        JwtClaims {
            iss: self.issuer(),
            sub: self.subject(),
            iat,
            exp: iat + self.lifetime.num_seconds(),
        }
    }

    /// Signed RS256 token valid from `now`
    pub fn jwt(&self, now: DateTime<Utc>) -> DialectorResult<String> {
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };
        let header = serde_json::to_vec(&header).map_err(|e| DialectorError::Signing(e.to_string()))?;
        let claims = serde_json::to_vec(&self.claims(now))
            .map_err(|e| DialectorError::Signing(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self.key.sign(signing_input.as_bytes())?;
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

impl fmt::Debug for KeyPairCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairCredential")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("fingerprint", &self.fingerprint)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Account identifier as it appears in token claims: uppercased, without
/// any region or cloud suffix
fn token_account(account: &str) -> String {
    let account = account.trim();
    account
        .split('.')
        .next()
        .unwrap_or(account)
        .to_uppercase()
}
