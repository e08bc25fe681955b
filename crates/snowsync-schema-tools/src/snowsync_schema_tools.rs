//! Snowsync Schema Tools - Schema synchronization for the warehouse
//!
//! This crate provides functionality for:
//! - Describing desired entities (`model`)
//! - Deterministic, length-bounded identifier naming (`naming`)
//! - Mapping logical types to DDL and normalizing introspected types (`typemap`)
//! - Building foreign-key and check constraint fragments (`constraint`)
//! - Reading live metadata from INFORMATION_SCHEMA (`catalog`)
//! - Converging a live schema to the desired one (`sync`)

pub mod catalog;
pub mod constraint;
mod error;
pub mod model;
pub mod naming;
pub mod ordering;
pub mod sync;
pub mod typemap;

#[cfg(test)]
mod test_support;

pub use catalog::*;
pub use constraint::*;
pub use error::*;
pub use model::*;
pub use naming::*;
pub use ordering::*;
pub use sync::*;
pub use typemap::*;
