//! Live metadata introspection
//!
//! Every call re-reads INFORMATION_SCHEMA; nothing is cached between
//! entities or passes.

mod column;
mod information_schema;

#[cfg(test)]
mod tests;

pub use column::*;
pub use information_schema::*;
