//! Inlines calls to single-signature, non-recursive, defined,
//! non-built-in functions at their call site.
//!
//! Only handles a `Call` used either as a bare statement or as the rhs
//! of an `Assignment` whose body's sole `return` (if any) is its last
//! top-level statement; a function that returns from inside nested
//! control flow is left for a later sweep once `if_simplification`/
//! `tree_grafting` have had a chance to flatten it.

use glopt_core::clone::CloneMap;
use glopt_core::ir::*;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| inline_in_list(list, arena, reg))
}

fn inline_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < list.len() {
        let stmt_id = list.get(i).expect("i < list.len()");
        match try_inline_statement(stmt_id, arena, reg) {
            Some(replacement) => {
                let n = replacement.len().max(1);
                list.splice_at(i, replacement);
                i += n;
                changed = true;
            }
            None => i += 1,
        }
    }
    changed
}

fn try_inline_statement(
    stmt_id: InstrId,
    arena: &mut Arena,
    reg: &mut TypeRegistry,
) -> Option<Vec<InstrId>> {
    match arena.get(stmt_id).clone() {
        Instr::Call(call) => inline_call(&call, None, arena, reg),
        Instr::Assignment(a) => {
            if matches!(arena.get(a.rhs), Instr::Call(_)) {
                let Instr::Call(call) = arena.get(a.rhs).clone() else {
                    unreachable!()
                };
                inline_call(&call, Some((a.lhs, a.write_mask)), arena, reg)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn inline_call(
    call: &CallInstr,
    sink: Option<(InstrId, u8)>,
    arena: &mut Arena,
    reg: &mut TypeRegistry,
) -> Option<Vec<InstrId>> {
    let Instr::Function(func) = arena.get(call.callee).clone() else {
        return None;
    };
    if func.signatures.len() != 1 {
        return None;
    }
    let sig_id = func.signatures[0];
    let Instr::FunctionSignature(sig) = arena.get(sig_id).clone() else {
        return None;
    };
    if !sig.is_defined || sig.is_built_in {
        return None;
    }
    if calls_function(&sig.body, arena, call.callee) {
        return None; // recursive; never inline
    }

    let mut clone_map = CloneMap::new();
    let mut prelude = Vec::new();
    for (&param_id, &arg_id) in sig.params.iter().zip(call.args.iter()) {
        let Instr::Variable(param_var) = arena.get(param_id).clone() else {
            return None;
        };
        let temp_id = arena.alloc(Instr::Variable(VariableInstr {
            name: format!("{}_inl{}", param_var.name, stmt_suffix(param_id)),
            ty: param_var.ty,
            storage: StorageQualifier::Temporary,
            interpolation: Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        clone_map.bind(param_id, temp_id);
        let width = reg.get(param_var.ty).ok()?.vector_width().unwrap_or(1);
        let deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr {
            var: temp_id,
            result_type: param_var.ty,
        }));
        let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref,
            rhs: arg_id,
            write_mask: util::full_mask(width),
            condition: None,
        }));
        prelude.push(temp_id);
        prelude.push(assign);
    }

    let mut body = clone_map.clone_list(arena, &sig.body);

    // Convert the trailing `return`, if any, into either nothing (call
    // used as a bare statement) or an assignment into the call site's
    // lhs (call used as an rvalue).
    if let Some(last_idx) = body.len().checked_sub(1) {
        let last_id = body.get(last_idx).unwrap();
        if let Instr::Return(ret) = arena.get(last_id).clone() {
            body.remove(last_idx);
            if let (Some((lhs, write_mask)), Some(value)) = (sink, ret.value) {
                let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
                    lhs,
                    rhs: value,
                    write_mask,
                    condition: None,
                }));
                body.push_back(assign);
            }
        } else if body_contains_return(&body, arena) {
            return None; // return nested in control flow; not handled here
        }
    }

    let mut result: Vec<InstrId> = prelude;
    result.extend(body.iter());
    Some(result)
}

fn calls_function(list: &InstrList, arena: &Arena, target: InstrId) -> bool {
    for id in list.iter() {
        if instr_calls(id, arena, target) {
            return true;
        }
    }
    false
}

fn instr_calls(id: InstrId, arena: &Arena, target: InstrId) -> bool {
    let mut found = false;
    glopt_core::visit::for_each_operand(arena.get(id), |child| {
        found |= instr_calls(child, arena, target);
    });
    if let Instr::Call(c) = arena.get(id) {
        if c.callee == target {
            found = true;
        }
    }
    match arena.get(id) {
        Instr::If(i) => {
            found |= calls_function(&i.then_list, arena, target);
            found |= calls_function(&i.else_list, arena, target);
        }
        Instr::Loop(l) => found |= calls_function(&l.body, arena, target),
        _ => {}
    }
    found
}

fn body_contains_return(list: &InstrList, arena: &Arena) -> bool {
    for id in list.iter() {
        match arena.get(id) {
            Instr::Return(_) => return true,
            Instr::If(i) => {
                if body_contains_return(&i.then_list, arena) || body_contains_return(&i.else_list, arena) {
                    return true;
                }
            }
            Instr::Loop(l) => {
                if body_contains_return(&l.body, arena) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Cheap per-call uniqueness suffix for synthesized temporaries, derived
/// from the parameter's own id so distinct call sites never collide.
fn stmt_suffix(id: InstrId) -> String {
    id.to_string().trim_start_matches('%').to_string()
}
