//! Simplifies `If` statements: drops ones with two empty branches,
//! replaces a constant-condition `If` with the taken branch spliced in
//! place, and normalizes `if (!c) A else B` to `if (c) B else A`.

use glopt_core::ir::{ExprOp, Instr};
use glopt_core::ops::UnaryOp;
use glopt_core::{Arena, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| simplify_in_list(list, arena, reg))
}

fn simplify_in_list(list: &mut InstrList, arena: &mut Arena, _reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < list.len() {
        let id = list.get(i).expect("i < list.len()");
        let Instr::If(if_instr) = arena.get(id).clone() else {
            i += 1;
            continue;
        };

        if if_instr.then_list.is_empty() && if_instr.else_list.is_empty() {
            list.remove(i);
            changed = true;
            continue;
        }

        if let Instr::Constant(c) = arena.get(if_instr.condition) {
            if let Some(glopt_core::types::ConstLane::Bool(b)) = c.lanes.first().copied() {
                let taken = if b { if_instr.then_list.clone() } else { if_instr.else_list.clone() };
                let replacement: Vec<_> = taken.iter().collect();
                let n = replacement.len().max(1);
                list.splice_at(i, replacement);
                i += n;
                changed = true;
                continue;
            }
        }

        if let Instr::Expression(e) = arena.get(if_instr.condition) {
            if let ExprOp::Unary(UnaryOp::LogicNot) = e.op {
                let inner_cond = e.operands[0];
                *arena.get_mut(id) = Instr::If(glopt_core::ir::IfInstr {
                    condition: inner_cond,
                    then_list: if_instr.else_list.clone(),
                    else_list: if_instr.then_list.clone(),
                });
                changed = true;
            }
        }

        i += 1;
    }
    changed
}
