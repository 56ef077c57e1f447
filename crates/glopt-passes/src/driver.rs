//! The fixed-point optimization loop: runs every pass, in a fixed order,
//! repeatedly until a full sweep makes no further progress.

use glopt_core::{Arena, InstrList, TypeRegistry};

use crate::{
    algebraic, constant, copy_propagation, dead_code, dead_functions, function_inlining,
    if_simplification, structure_splitting, swizzle, tree_grafting,
};

/// Knobs governing the driver; analogous to the teacher's codegen-level
/// `CompileOptions`.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Defensive backstop against a pass that violates the termination
    /// contract. Not expected to be reached on valid input.
    pub max_sweeps: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig { max_sweeps: 1000 }
    }
}

/// One pass's report for a single sweep.
#[derive(Debug, Clone, Copy)]
pub struct PassOutcome {
    pub changed: bool,
}

type PassFn = fn(&mut InstrList, &mut Arena, &mut TypeRegistry) -> bool;

/// Fixed order extracted from the original optimizer's sweep loop.
/// `vec_index_to_cond_assign` is deliberately absent -- see the crate's
/// design notes.
const PASSES: &[(&str, PassFn)] = &[
    ("function_inlining", function_inlining::run),
    ("dead_functions", dead_functions::run),
    ("structure_splitting", structure_splitting::run),
    ("if_simplification", if_simplification::run),
    ("copy_propagation", copy_propagation::run),
    ("dead_code_local", dead_code::dead_code_local),
    ("dead_code_unlinked", dead_code::dead_code_unlinked),
    ("tree_grafting", tree_grafting::run),
    ("constant_propagation", constant::propagate),
    ("constant_variable_unlinked", constant::variable_unlinked),
    ("constant_folding", constant::fold),
    ("algebraic", algebraic::run),
    ("vec_index_to_swizzle", swizzle::vec_index_to_swizzle),
    ("swizzle_swizzle", swizzle::swizzle_swizzle),
    ("noop_swizzle", swizzle::noop_swizzle),
];

/// Runs every pass in `PASSES`, in order, repeatedly until a full sweep
/// reports no progress at all, or `config.max_sweeps` is reached.
pub fn optimize(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry, config: DriverConfig) {
    for sweep in 0..config.max_sweeps {
        let mut sweep_changed = false;
        for (name, pass) in PASSES {
            let outcome = PassOutcome { changed: pass(list, arena, reg) };
            tracing::trace!(pass = name, sweep, changed = outcome.changed, "ran optimization pass");
            sweep_changed |= outcome.changed;
        }
        if !sweep_changed {
            tracing::debug!(sweeps = sweep + 1, "optimization reached a fixed point");
            return;
        }
    }
    tracing::warn!(
        max_sweeps = config.max_sweeps,
        "optimization driver hit its sweep cap without reaching a fixed point"
    );
}
