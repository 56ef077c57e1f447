//! Fixed-point optimization driver and rewrite passes over the shader IR.

pub mod algebraic;
pub mod constant;
pub mod copy_propagation;
pub mod dead_code;
pub mod dead_functions;
pub mod driver;
pub mod function_inlining;
pub mod if_simplification;
pub mod structure_splitting;
pub mod swizzle;
pub mod tree_grafting;
pub mod util;

pub use driver::{optimize, DriverConfig, PassOutcome};
