//! Desired-schema description
//!
//! Entities, fields, relationships and check constraints as the caller
//! declares them. Everything here deserializes from TOML or JSON so schema
//! files can be loaded directly.

mod entity;
mod field;

#[cfg(test)]
mod tests;

pub use entity::*;
pub use field::*;
