//! Identifier naming
//!
//! A pluggable base strategy ([`Namer`], [`DefaultNamer`]) produces names
//! from source identifiers; [`WarehouseNamer`] wraps any base strategy and
//! applies the warehouse policy on top: uppercase everything, quote the
//! handful of reserved column names, and bound generated constraint names
//! to the identifier limit with a deterministic hash suffix.

mod namer;
mod warehouse;


pub use namer::*;
pub use warehouse::*;
