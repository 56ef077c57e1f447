//! `dead_code_local` removes an assignment whose value is overwritten (on
//! the same lanes) before being read, within a single block.
//! `dead_code_unlinked` removes a variable declaration, and every
//! assignment to it, when nothing in the whole tree ever reads it.

use std::collections::{HashMap, HashSet};

use glopt_core::ir::Instr;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn dead_code_local(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| local_in_list(list, arena, reg))
}

/// Walks a block backwards. Tracks, per variable, which lanes written so
/// far have not since been read. A later write to the same (or a
/// superset of) those lanes, with no intervening read, means the earlier
/// write's value was never observed -- drop it.
fn local_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut dead_masks: HashMap<InstrId, u8> = HashMap::new();
    let mut to_remove: HashSet<usize> = HashSet::new();

    let ids: Vec<InstrId> = list.iter().collect();
    for (idx, id) in ids.iter().enumerate().rev() {
        let id = *id;
        // Any variable read anywhere in this statement's rvalue operands
        // (other than the lhs of a plain assignment) clears its dead mask.
        let reads = collect_reads(id, arena);
        for var in reads {
            dead_masks.remove(&var);
        }

        if let Instr::Assignment(a) = arena.get(id).clone() {
            // The condition (if any) and rhs are rvalues read by this
            // statement; `collect_reads` above already walked them via
            // `for_each_operand`, so only the write itself remains to
            // analyze.
            if a.condition.is_none() {
                if let Instr::DerefVariable(d) = arena.get(a.lhs) {
                    let var = d.var;
                    let already_dead = dead_masks.get(&var).copied().unwrap_or(0);
                    if already_dead & a.write_mask == a.write_mask {
                        to_remove.insert(idx);
                    }
                    let full = match arena.get(var) {
                        Instr::Variable(v) => {
                            reg.get(v.ty).ok().and_then(|t| t.vector_width()).map(util::full_mask)
                        }
                        _ => None,
                    };
                    let new_dead = already_dead | a.write_mask;
                    dead_masks.insert(var, full.map(|f| new_dead & f).unwrap_or(new_dead));
                }
            }
        }
    }

    if to_remove.is_empty() {
        return false;
    }
    let mut idx = 0;
    let mut out = InstrList::new();
    for id in list.iter() {
        if !to_remove.contains(&idx) {
            out.push_back(id);
        }
        idx += 1;
    }
    *list = out;
    true
}

/// Every variable read by this statement's rvalue operand tree (not
/// counting the destination of its own top-level assignment).
fn collect_reads(id: InstrId, arena: &Arena) -> Vec<InstrId> {
    let mut out = Vec::new();
    if let Instr::Assignment(a) = arena.get(id) {
        collect_reads_expr(a.rhs, arena, &mut out);
        if let Some(cond) = a.condition {
            collect_reads_expr(cond, arena, &mut out);
        }
        // A partial write still "reads" the destination conceptually (the
        // unwritten lanes keep their old value), but a full write defined
        // by the control flow above does not; that distinction is handled
        // by the caller via the write mask, so only rhs/condition reads
        // are collected here.
    } else {
        collect_reads_expr(id, arena, &mut out);
    }
    out
}

fn collect_reads_expr(id: InstrId, arena: &Arena, out: &mut Vec<InstrId>) {
    if let Instr::DerefVariable(d) = arena.get(id) {
        out.push(d.var);
    }
    glopt_core::visit::for_each_operand(arena.get(id), |c| collect_reads_expr(c, arena, out));
    match arena.get(id) {
        Instr::If(i) => {
            for s in i.then_list.iter() {
                collect_reads_expr(s, arena, out);
            }
            for s in i.else_list.iter() {
                collect_reads_expr(s, arena, out);
            }
        }
        Instr::Loop(l) => {
            for s in l.body.iter() {
                collect_reads_expr(s, arena, out);
            }
        }
        _ => {}
    }
}

pub fn dead_code_unlinked(list: &mut InstrList, arena: &mut Arena, _reg: &mut TypeRegistry) -> bool {
    let declared = collect_declarations(list, arena);
    if declared.is_empty() {
        return false;
    }

    let mut read: HashSet<InstrId> = HashSet::new();
    collect_all_reads(list, arena, &mut read);

    let dead: HashSet<InstrId> = declared.difference(&read).copied().collect();
    if dead.is_empty() {
        return false;
    }

    remove_dead(list, arena, &dead)
}

fn collect_declarations(list: &InstrList, arena: &Arena) -> HashSet<InstrId> {
    list.iter()
        .filter(|&id| matches!(arena.get(id), Instr::Variable(v) if v.storage == glopt_core::ir::StorageQualifier::Temporary || v.storage == glopt_core::ir::StorageQualifier::Auto))
        .collect()
}

fn collect_all_reads(list: &InstrList, arena: &Arena, out: &mut HashSet<InstrId>) {
    for id in list.iter() {
        match arena.get(id) {
            Instr::Variable(_) => {}
            Instr::Assignment(a) => {
                let mut reads = Vec::new();
                collect_reads_expr(a.rhs, arena, &mut reads);
                if let Some(cond) = a.condition {
                    collect_reads_expr(cond, arena, &mut reads);
                }
                out.extend(reads);
            }
            _ => {
                let mut reads = Vec::new();
                collect_reads_expr(id, arena, &mut reads);
                out.extend(reads);
            }
        }
        match arena.get(id) {
            Instr::If(i) => {
                collect_all_reads(&i.then_list, arena, out);
                collect_all_reads(&i.else_list, arena, out);
            }
            Instr::Loop(l) => collect_all_reads(&l.body, arena, out),
            Instr::FunctionSignature(sig) => collect_all_reads(&sig.body, arena, out),
            Instr::Function(f) => {
                for &sig_id in &f.signatures {
                    if let Instr::FunctionSignature(sig) = arena.get(sig_id) {
                        collect_all_reads(&sig.body, arena, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn remove_dead(list: &mut InstrList, arena: &Arena, dead: &HashSet<InstrId>) -> bool {
    let mut changed = false;
    let mut out = InstrList::new();
    for id in list.iter() {
        let drop = match arena.get(id) {
            Instr::Variable(_) if dead.contains(&id) => true,
            Instr::Assignment(a) => match arena.get(a.lhs) {
                Instr::DerefVariable(d) => dead.contains(&d.var),
                _ => false,
            },
            _ => false,
        };
        if drop {
            changed = true;
        } else {
            out.push_back(id);
        }
    }
    *list = out;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use glopt_core::ir::{AssignmentInstr, DerefVariableInstr, VariableInstr};
    use glopt_core::TypeId;

    fn float_var(arena: &mut Arena, name: &str, storage: glopt_core::ir::StorageQualifier) -> InstrId {
        arena.alloc(Instr::Variable(VariableInstr {
            name: name.to_string(),
            ty: TypeId::FLOAT,
            storage,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }))
    }

    fn deref(arena: &mut Arena, var: InstrId) -> InstrId {
        arena.alloc(Instr::DerefVariable(DerefVariableInstr { var, result_type: TypeId::FLOAT }))
    }

    fn float_const(arena: &mut Arena, v: f64) -> InstrId {
        arena.alloc(Instr::Constant(glopt_core::ir::ConstantInstr {
            ty: TypeId::FLOAT,
            lanes: smallvec::smallvec![glopt_core::ConstLane::Float(v)],
            elements: Vec::new(),
        }))
    }

    #[test]
    fn local_pass_drops_a_write_overwritten_before_any_read() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let x = float_var(&mut arena, "x", glopt_core::ir::StorageQualifier::Temporary);
        let one = float_const(&mut arena, 1.0);
        let first = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, x),
            rhs: one,
            write_mask: 1,
            condition: None,
        }));
        let two = float_const(&mut arena, 2.0);
        let second = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, x),
            rhs: two,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [x, first, second].into_iter().collect();

        assert!(dead_code_local(&mut list, &mut arena, &mut reg));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1), Some(second));
    }

    #[test]
    fn unlinked_pass_removes_a_temporary_never_read() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let unused = float_var(&mut arena, "unused", glopt_core::ir::StorageQualifier::Temporary);
        let zero = float_const(&mut arena, 0.0);
        let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, unused),
            rhs: zero,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [unused, assign].into_iter().collect();

        assert!(dead_code_unlinked(&mut list, &mut arena, &mut reg));
        assert!(list.is_empty());
    }

    #[test]
    fn unlinked_pass_never_touches_output_storage() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let out = float_var(&mut arena, "out", glopt_core::ir::StorageQualifier::Out);
        let zero = float_const(&mut arena, 0.0);
        let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, out),
            rhs: zero,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [out, assign].into_iter().collect();

        assert!(!dead_code_unlinked(&mut list, &mut arena, &mut reg));
        assert_eq!(list.len(), 2);
    }
}
