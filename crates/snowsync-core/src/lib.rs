//! Snowsync Core - Execution boundary shared by the snowsync crates
//!
//! This crate defines the seams between the schema engine and whatever
//! actually talks to the warehouse:
//!
//! - `DatabaseDriver` - Trait for transports that open connections
//! - `Connection` - Trait for an open session that executes SQL
//! - `Transaction` / `SavepointSupport` - Transaction handles
//! - Common types like `Value`, `Row`, `QueryResult`, etc.

mod connection;
mod driver;
mod error;
pub mod transaction;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use transaction::*;
pub use types::*;
