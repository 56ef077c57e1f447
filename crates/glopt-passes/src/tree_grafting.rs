//! Grafts the right-hand side of a variable written exactly once, and
//! read exactly once anywhere in the tree, directly into its use site,
//! eliminating both the temporary and the copy through it.
//!
//! Broader than [`crate::copy_propagation`]: the right-hand side can be
//! any expression, not just another variable read.

use std::collections::HashMap;

use glopt_core::ir::Instr;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let candidates = find_candidates(list, arena, reg);
    if candidates.is_empty() {
        return false;
    }
    util::visit_lists_mut(list, arena, &mut |list, arena| graft_in_list(list, arena, &candidates))
}

struct Candidate {
    rhs: InstrId,
    assignment_stmt: InstrId,
}

/// A variable qualifies when it is written exactly once with a full-mask,
/// unconditional assignment, and read exactly once anywhere in the tree.
fn find_candidates(
    list: &InstrList,
    arena: &Arena,
    reg: &mut TypeRegistry,
) -> HashMap<InstrId, Candidate> {
    let mut writes: HashMap<InstrId, (u32, Option<Candidate>)> = HashMap::new();
    collect_writes(list, arena, reg, &mut writes);

    let mut reads: HashMap<InstrId, u32> = HashMap::new();
    collect_read_counts(list, arena, &mut reads);

    writes
        .into_iter()
        .filter_map(|(var, (count, candidate))| {
            let candidate = candidate?;
            if count == 1 && reads.get(&var).copied().unwrap_or(0) == 1 {
                Some((var, candidate))
            } else {
                None
            }
        })
        .collect()
}

fn collect_writes(
    list: &InstrList,
    arena: &Arena,
    reg: &mut TypeRegistry,
    out: &mut HashMap<InstrId, (u32, Option<Candidate>)>,
) {
    for id in list.iter() {
        if let Instr::Assignment(a) = arena.get(id) {
            if a.condition.is_none() {
                if let Instr::DerefVariable(d) = arena.get(a.lhs) {
                    let var = d.var;
                    let full = match arena.get(var) {
                        Instr::Variable(v) => {
                            reg.get(v.ty).ok().and_then(|t| t.vector_width()).map(util::full_mask)
                        }
                        _ => None,
                    };
                    let entry = out.entry(var).or_insert((0, None));
                    entry.0 += 1;
                    if full == Some(a.write_mask) && entry.0 == 1 {
                        entry.1 = Some(Candidate { rhs: a.rhs, assignment_stmt: id });
                    } else {
                        entry.1 = None;
                    }
                }
            }
        }
        recurse_lists(id, arena, |inner| collect_writes(inner, arena, reg, out));
    }
}

fn collect_read_counts(list: &InstrList, arena: &Arena, out: &mut HashMap<InstrId, u32>) {
    for id in list.iter() {
        match arena.get(id) {
            Instr::Assignment(a) => {
                count_reads_expr(a.rhs, arena, out);
                if let Some(cond) = a.condition {
                    count_reads_expr(cond, arena, out);
                }
            }
            _ => count_reads_expr(id, arena, out),
        }
        recurse_lists(id, arena, |inner| collect_read_counts(inner, arena, out));
    }
}

fn count_reads_expr(id: InstrId, arena: &Arena, out: &mut HashMap<InstrId, u32>) {
    if let Instr::DerefVariable(d) = arena.get(id) {
        *out.entry(d.var).or_insert(0) += 1;
    }
    glopt_core::visit::for_each_operand(arena.get(id), |c| count_reads_expr(c, arena, out));
}

fn recurse_lists(id: InstrId, arena: &Arena, mut f: impl FnMut(&InstrList)) {
    match arena.get(id) {
        Instr::If(i) => {
            f(&i.then_list);
            f(&i.else_list);
        }
        Instr::Loop(l) => f(&l.body),
        Instr::FunctionSignature(sig) => f(&sig.body),
        Instr::Function(func) => {
            for &sig_id in &func.signatures {
                if let Instr::FunctionSignature(sig) = arena.get(sig_id) {
                    f(&sig.body);
                }
            }
        }
        _ => {}
    }
}

fn graft_in_list(
    list: &mut InstrList,
    arena: &mut Arena,
    candidates: &HashMap<InstrId, Candidate>,
) -> bool {
    let mut changed = false;

    // Substitute the sole read, wherever in this list it lives.
    for id in list.iter() {
        changed |= substitute_read(id, arena, candidates);
    }

    // Drop the assignment statement for any variable grafted above.
    let mut out = InstrList::new();
    for id in list.iter() {
        let is_grafted_assignment = candidates.values().any(|c| c.assignment_stmt == id);
        if is_grafted_assignment {
            changed = true;
        } else {
            out.push_back(id);
        }
    }
    *list = out;
    changed
}

fn substitute_read(id: InstrId, arena: &mut Arena, candidates: &HashMap<InstrId, Candidate>) -> bool {
    let mut changed = false;
    let children: Vec<InstrId> = {
        let mut out = Vec::new();
        glopt_core::visit::for_each_operand(arena.get(id), |c| out.push(c));
        out
    };
    for child in children {
        if let Instr::DerefVariable(d) = arena.get(child) {
            if let Some(candidate) = candidates.get(&d.var) {
                let rhs = arena.get(candidate.rhs).clone();
                *arena.get_mut(child) = rhs;
                changed = true;
                continue;
            }
        }
        changed |= substitute_read(child, arena, candidates);
    }
    changed
}
