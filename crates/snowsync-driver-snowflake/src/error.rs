//! Dialector errors

use snowsync_core::CoreError;

/// Errors raised while configuring or opening a warehouse connection.
///
/// Parameter and key errors are raised before any I/O.
#[derive(Debug, thiserror::Error)]
pub enum DialectorError {
    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("invalid database: {0}")]
    InvalidDatabase(String),

    #[error("private key cannot be empty: {0}")]
    EmptyPrivateKey(String),

    #[error("malformed PEM block: {0}")]
    MalformedPemBlock(String),

    #[error("invalid PEM block type: expected PRIVATE KEY or RSA PRIVATE KEY, got '{0}'")]
    InvalidPemBlockType(String),

    #[error("failed to parse private key: {0}")]
    KeyParsingFailed(String),

    #[error("unsupported private key type: only RSA keys are supported")]
    UnsupportedKeyType,

    #[error("private key validation failed: {0}")]
    KeyValidationFailed(String),

    #[error("RSA key size {bits} bits is too small, minimum {minimum} bits required", minimum = crate::MIN_RSA_KEY_BITS)]
    KeyTooSmall { bits: usize },

    #[error("invalid DSN: {0}")]
    InvalidDsn(String),

    #[error("no connection information provided: must specify a pool, a connector or a DSN")]
    NoConnectionSource,

    #[error("failed to establish connection: {0}")]
    ConnectionFailed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<DialectorError> for CoreError {
    fn from(err: DialectorError) -> Self {
        match err {
            DialectorError::Core(inner) => inner,
            DialectorError::ConnectionFailed(message) => CoreError::Connection(message),
            other => CoreError::Configuration(other.to_string()),
        }
    }
}

/// Result type for dialector operations
pub type DialectorResult<T> = Result<T, DialectorError>;
