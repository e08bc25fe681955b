//! Snowflake dialector for snowsync
//!
//! This crate wires a connection source to the schema migrator:
//! DSN parsing, key-pair (JWT) authentication, savepoint emulation and the
//! warehouse's capability set. The wire protocol itself is left to a
//! caller-supplied [`snowsync_core::DatabaseDriver`] transport.

mod connector;
mod credentials;
mod der;
mod dialector;
mod dsn;
mod error;
mod savepoint;

#[cfg(test)]
mod credentials_tests;
#[cfg(test)]
mod dialector_tests;
#[cfg(test)]
mod dsn_tests;

pub use connector::*;
pub use credentials::*;
pub use dialector::*;
pub use dsn::Dsn;
pub use error::*;
pub use savepoint::SavepointTransaction;
