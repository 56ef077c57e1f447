//! Typed IR, interned type registry, and structural validator for the
//! shader optimizing compiler.
//!
//! This crate owns the data model only: the arena, instruction lists,
//! the sixteen instruction kinds, the type registry, and the validator
//! that checks the invariants every pass must preserve. The fixed-point
//! driver and its passes live in `glopt-passes`; the printer lives in
//! `glopt-print`; both depend on this crate.

pub mod arena;
pub mod clone;
pub mod error;
pub mod frontend;
pub mod ir;
pub mod list;
pub mod ops;
pub mod type_id;
pub mod types;
pub mod validator;
pub mod visit;

pub use arena::{Arena, InstrId};
pub use error::{CompileError, Result};
pub use ir::Instr;
pub use list::{Cursor, InstrList};
pub use type_id::{TypeId, TypeRegistry};
pub use types::{BaseKind, ConstLane, GlslType, SamplerKind, StructDef};
