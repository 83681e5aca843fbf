//! Structural query layer: struct/field views and the approximate
//! implements check.
//!
//! Results here are recomputed from parsed syntax on every request; the
//! only cached step is parsing itself. Nothing in this layer consults the
//! loader's symbol index.

pub(crate) mod implements;
mod structs;

pub use structs::{FieldInfo, StructInfo};
