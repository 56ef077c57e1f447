//! Within a single block, replaces reads of a variable that was last
//! assigned from another variable (`a = b;`) by reads of the source
//! variable, until a later write kills the copy.

use std::collections::HashMap;

use glopt_core::ir::Instr;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| propagate_in_list(list, arena, reg))
}

fn propagate_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    // Maps a variable to the variable it currently reads the same value as.
    let mut copies: HashMap<InstrId, InstrId> = HashMap::new();

    for id in list.iter() {
        changed |= substitute_reads(id, arena, &copies);

        if let Instr::Assignment(a) = arena.get(id) {
            let (lhs, rhs, write_mask) = (a.lhs, a.rhs, a.write_mask);
            let dst = match arena.get(lhs) {
                Instr::DerefVariable(d) => Some(d.var),
                _ => None,
            };
            let Some(dst) = dst else { continue };

            let full = match arena.get(dst) {
                Instr::Variable(v) => reg.get(v.ty).ok().and_then(|t| t.vector_width()).map(util::full_mask),
                _ => None,
            };
            let is_full_write = full == Some(write_mask);

            let src = match arena.get(rhs) {
                Instr::DerefVariable(d) if is_full_write && d.var != dst => Some(d.var),
                _ => None,
            };

            // A write to `dst` kills both its old copy-of relationship and
            // any other variable's copy-of relationship that pointed at
            // `dst` as its source (it may now hold a stale value).
            copies.remove(&dst);
            copies.retain(|_, v| *v != dst);
            if let Some(src) = src {
                copies.insert(dst, src);
            }
        }
    }
    changed
}

/// Rewrites reads of a copied-from variable within `id`'s operand tree.
/// When `id` is itself an `Assignment`, its own `lhs` is excluded --
/// substituting it would rewrite the destination being written, not a
/// read of it.
fn substitute_reads(id: InstrId, arena: &mut Arena, copies: &HashMap<InstrId, InstrId>) -> bool {
    let mut changed = false;
    let children: Vec<InstrId> = {
        let mut out = Vec::new();
        match arena.get(id) {
            Instr::Assignment(a) => {
                out.push(a.rhs);
                if let Some(cond) = a.condition {
                    out.push(cond);
                }
            }
            instr => glopt_core::visit::for_each_operand(instr, |c| out.push(c)),
        }
        out
    };
    for child in children {
        if let Instr::DerefVariable(d) = arena.get(child) {
            if let Some(&source_var) = copies.get(&d.var) {
                let result_type = d.result_type;
                *arena.get_mut(child) = Instr::DerefVariable(glopt_core::ir::DerefVariableInstr {
                    var: source_var,
                    result_type,
                });
                changed = true;
                continue;
            }
        }
        changed |= substitute_reads(child, arena, copies);
    }
    changed
}
