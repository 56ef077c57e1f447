//! Replaces a local struct-typed variable by one variable per field when
//! every use of the variable is immediately a field access (`.field`),
//! never a whole-struct assignment, return, or call argument.
//!
//! Restricted to variables declared directly in the list being scanned
//! (not ones declared inside a nested `if`/`loop` body); those are left
//! for a future sweep to hoist first.

use std::collections::HashSet;

use glopt_core::ir::*;
use glopt_core::types::GlslType;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| split_in_list(list, arena, reg))
}

fn split_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let candidates: Vec<(usize, InstrId, StructDef)> = list
        .iter()
        .enumerate()
        .filter_map(|(idx, id)| match arena.get(id) {
            Instr::Variable(v) => match reg.get(v.ty).ok()? {
                GlslType::Struct(def) => Some((idx, id, def.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect();

    let mut changed = false;
    for (idx, var_id, def) in candidates {
        if let Some(field_derefs) = safe_to_split(list, arena, var_id) {
            split_variable(list, arena, idx, var_id, &def, &field_derefs);
            changed = true;
        }
    }
    changed
}

/// Returns the set of `DerefRecord` node ids that access `var_id` as a
/// whole, if (and only if) every reference to `var_id` goes through one
/// of them. `None` means some other (unsplittable) use exists.
fn safe_to_split(list: &InstrList, arena: &Arena, var_id: InstrId) -> Option<HashSet<InstrId>> {
    let mut deref_ids = HashSet::new();
    collect_deref_variable(list, arena, var_id, &mut deref_ids);
    if deref_ids.is_empty() {
        return None;
    }
    let mut record_field_uses = HashSet::new();
    collect_record_uses(list, arena, &deref_ids, &mut record_field_uses);
    if record_field_uses.len() == deref_ids.len() {
        Some(record_field_uses)
    } else {
        None
    }
}

fn collect_deref_variable(list: &InstrList, arena: &Arena, var_id: InstrId, out: &mut HashSet<InstrId>) {
    for id in list.iter() {
        collect_deref_variable_instr(id, arena, var_id, out);
    }
}

fn collect_deref_variable_instr(id: InstrId, arena: &Arena, var_id: InstrId, out: &mut HashSet<InstrId>) {
    glopt_core::visit::for_each_operand(arena.get(id), |child| {
        collect_deref_variable_instr(child, arena, var_id, out)
    });
    if let Instr::DerefVariable(d) = arena.get(id) {
        if d.var == var_id {
            out.insert(id);
        }
    }
    match arena.get(id) {
        Instr::If(i) => {
            collect_deref_variable(&i.then_list, arena, var_id, out);
            collect_deref_variable(&i.else_list, arena, var_id, out);
        }
        Instr::Loop(l) => collect_deref_variable(&l.body, arena, var_id, out),
        _ => {}
    }
}

fn collect_record_uses(
    list: &InstrList,
    arena: &Arena,
    deref_ids: &HashSet<InstrId>,
    out: &mut HashSet<InstrId>,
) {
    for id in list.iter() {
        collect_record_uses_instr(id, arena, deref_ids, out);
    }
}

fn collect_record_uses_instr(
    id: InstrId,
    arena: &Arena,
    deref_ids: &HashSet<InstrId>,
    out: &mut HashSet<InstrId>,
) {
    glopt_core::visit::for_each_operand(arena.get(id), |child| {
        collect_record_uses_instr(child, arena, deref_ids, out)
    });
    if let Instr::DerefRecord(d) = arena.get(id) {
        if deref_ids.contains(&d.record) {
            out.insert(d.record);
        }
    }
    match arena.get(id) {
        Instr::If(i) => {
            collect_record_uses(&i.then_list, arena, deref_ids, out);
            collect_record_uses(&i.else_list, arena, deref_ids, out);
        }
        Instr::Loop(l) => collect_record_uses(&l.body, arena, deref_ids, out),
        _ => {}
    }
}

fn split_variable(
    list: &mut InstrList,
    arena: &mut Arena,
    decl_idx: usize,
    var_id: InstrId,
    def: &StructDef,
    field_derefs: &HashSet<InstrId>,
) {
    let Instr::Variable(orig) = arena.get(var_id).clone() else {
        return;
    };
    let mut field_vars = Vec::new();
    for (field_name, &field_ty) in def.fields.iter() {
        let field_var = arena.alloc(Instr::Variable(VariableInstr {
            name: format!("{}_{}", orig.name, field_name),
            ty: field_ty,
            storage: orig.storage,
            interpolation: orig.interpolation,
            centroid: orig.centroid,
            invariant: orig.invariant,
        }));
        field_vars.push(field_var);
    }

    // Rewrite every `DerefRecord{record: <deref of var_id>, field}` into a
    // `DerefVariable` of the matching split field variable, in place, so
    // no other referencing id needs to change.
    for &deref_id in field_derefs {
        // deref_id is itself a `DerefVariable` of var_id; find every
        // `DerefRecord` pointing at it and rewrite those.
        rewrite_record_uses(list, arena, deref_id, def, &field_vars);
    }

    list.remove(decl_idx);
    let mut insert_at = decl_idx;
    for &fv in &field_vars {
        list.insert(insert_at, fv);
        insert_at += 1;
    }
}

fn rewrite_record_uses(
    list: &InstrList,
    arena: &mut Arena,
    deref_id: InstrId,
    def: &StructDef,
    field_vars: &[InstrId],
) {
    let ids: Vec<InstrId> = collect_all_ids(list, arena);
    for id in ids {
        let replacement = match arena.get(id) {
            Instr::DerefRecord(d) if d.record == deref_id => {
                def.fields.get_index_of(&d.field).map(|idx| (field_vars[idx], d.result_type))
            }
            _ => None,
        };
        if let Some((field_var, result_type)) = replacement {
            *arena.get_mut(id) = Instr::DerefVariable(DerefVariableInstr {
                var: field_var,
                result_type,
            });
        }
    }
}

fn collect_all_ids(list: &InstrList, arena: &Arena) -> Vec<InstrId> {
    let mut out = Vec::new();
    for id in list.iter() {
        collect_all_ids_instr(id, arena, &mut out);
    }
    out
}

fn collect_all_ids_instr(id: InstrId, arena: &Arena, out: &mut Vec<InstrId>) {
    out.push(id);
    glopt_core::visit::for_each_operand(arena.get(id), |child| collect_all_ids_instr(child, arena, out));
    match arena.get(id) {
        Instr::If(i) => {
            for id in i.then_list.iter() {
                collect_all_ids_instr(id, arena, out);
            }
            for id in i.else_list.iter() {
                collect_all_ids_instr(id, arena, out);
            }
        }
        Instr::Loop(l) => {
            for id in l.body.iter() {
                collect_all_ids_instr(id, arena, out);
            }
        }
        _ => {}
    }
}
