//! Schema differ and migrator
//!
//! [`Migrator::synchronize`] walks the desired entities in dependency
//! order. An absent table is created whole; an existing table is diffed
//! column by column and then constraint by constraint. Introspection and
//! DDL go through a [`SchemaBackend`], so the diffing logic runs the same
//! against a live connection ([`LiveBackend`]) or a test double.

mod backend;
mod column;
mod ddl;
mod migrator;
mod resolve;

#[cfg(test)]
mod tests;

pub use backend::*;
pub use column::*;
pub use ddl::*;
pub use migrator::*;
pub use resolve::*;
