//! Recursive list rewriting shared by every pass.
//!
//! Each pass's core logic only needs to look at one [`InstrList`] at a
//! time; [`visit_lists_mut`] handles descending into the nested lists a
//! `FunctionSignature` body, an `If`'s two branches, or a `Loop` body
//! own, applying the same rewrite function at every level.

use glopt_core::ir::Instr;
use glopt_core::{Arena, InstrId, InstrList};

/// Applies `f` to `list`, then recurses into every nested list reachable
/// from `list`'s statements. Returns whether `f` reported a change at any
/// level.
pub fn visit_lists_mut(
    list: &mut InstrList,
    arena: &mut Arena,
    f: &mut dyn FnMut(&mut InstrList, &mut Arena) -> bool,
) -> bool {
    let mut changed = f(list, arena);
    let ids: Vec<InstrId> = list.iter().collect();
    for id in ids {
        changed |= visit_nested_lists(id, arena, f);
    }
    changed
}

fn visit_nested_lists(
    id: InstrId,
    arena: &mut Arena,
    f: &mut dyn FnMut(&mut InstrList, &mut Arena) -> bool,
) -> bool {
    let mut changed = false;
    match arena.get_mut(id) {
        Instr::FunctionSignature(sig) => {
            let mut body = std::mem::take(&mut sig.body);
            changed |= visit_lists_mut(&mut body, arena, f);
            if let Instr::FunctionSignature(sig) = arena.get_mut(id) {
                sig.body = body;
            }
        }
        Instr::If(if_instr) => {
            let mut then_list = std::mem::take(&mut if_instr.then_list);
            let mut else_list = std::mem::take(&mut if_instr.else_list);
            changed |= visit_lists_mut(&mut then_list, arena, f);
            changed |= visit_lists_mut(&mut else_list, arena, f);
            if let Instr::If(if_instr) = arena.get_mut(id) {
                if_instr.then_list = then_list;
                if_instr.else_list = else_list;
            }
        }
        Instr::Loop(loop_instr) => {
            let mut body = std::mem::take(&mut loop_instr.body);
            changed |= visit_lists_mut(&mut body, arena, f);
            if let Instr::Loop(loop_instr) = arena.get_mut(id) {
                loop_instr.body = body;
            }
        }
        Instr::Function(func) => {
            let sigs = func.signatures.clone();
            for sig_id in sigs {
                changed |= visit_nested_lists(sig_id, arena, f);
            }
        }
        _ => {}
    }
    changed
}

/// Full mask for a vector of `width` lanes (1 lane => `0b1`, 4 => `0b1111`).
pub fn full_mask(width: u8) -> u8 {
    if width >= 8 {
        0xFF
    } else {
        (1u8 << width) - 1
    }
}
