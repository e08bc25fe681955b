//! Type mapping between logical field types and warehouse DDL types
//!
//! Outbound: a [`FieldDescriptor`](crate::FieldDescriptor) becomes a DDL
//! type and a full column definition fragment.
//!
//! Inbound: an introspected type name is folded into a [`TypeCategory`] so
//! that declared and live columns can be compared. The catalog spells
//! types differently from how they were declared (`VARCHAR(256)` comes back
//! as `TEXT`, `BIGINT` as `NUMBER(38,0)`), and comparing raw names would
//! flag every column as changed on every pass.

mod inbound;
mod outbound;


pub use inbound::*;
pub use outbound::*;
