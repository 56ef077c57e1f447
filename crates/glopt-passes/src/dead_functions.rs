//! Removes `Function` definitions that no remaining `Call` references.
//!
//! Runs after `function_inlining` in the fixed-point order so a function
//! that became unreachable because its only call site was just inlined
//! is swept away in the same sweep's next pass.

use std::collections::HashSet;

use glopt_core::ir::Instr;
use glopt_core::{Arena, InstrList, TypeRegistry};

pub fn run(list: &mut InstrList, arena: &mut Arena, _reg: &mut TypeRegistry) -> bool {
    let mut referenced = HashSet::new();
    collect_calls(list, arena, &mut referenced);

    let before = list.len();
    let ids: Vec<_> = list.iter().collect();
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        let keep = match arena.get(id) {
            Instr::Function(_) => referenced.contains(&id),
            _ => true,
        };
        if keep {
            kept.push(id);
        }
    }
    let changed = kept.len() != before;
    *list = kept.into_iter().collect();
    changed
}

fn collect_calls(list: &InstrList, arena: &Arena, out: &mut HashSet<glopt_core::InstrId>) {
    for id in list.iter() {
        collect_calls_instr(id, arena, out);
    }
}

fn collect_calls_instr(id: glopt_core::InstrId, arena: &Arena, out: &mut HashSet<glopt_core::InstrId>) {
    glopt_core::visit::for_each_operand(arena.get(id), |child| collect_calls_instr(child, arena, out));
    match arena.get(id) {
        Instr::Call(c) => {
            out.insert(c.callee);
        }
        Instr::If(i) => {
            collect_calls(&i.then_list, arena, out);
            collect_calls(&i.else_list, arena, out);
        }
        Instr::Loop(l) => collect_calls(&l.body, arena, out),
        Instr::FunctionSignature(sig) => collect_calls(&sig.body, arena, out),
        Instr::Function(f) => {
            for &sig_id in &f.signatures {
                collect_calls_instr(sig_id, arena, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glopt_core::ir::{CallInstr, FunctionInstr, FunctionSignatureInstr};
    use glopt_core::TypeId;

    fn empty_signature(arena: &mut Arena) -> InstrId {
        arena.alloc(Instr::FunctionSignature(FunctionSignatureInstr {
            return_type: TypeId::VOID,
            params: Vec::new(),
            body: InstrList::new(),
            is_defined: true,
            is_built_in: false,
            parent: None,
        }))
    }

    #[test]
    fn a_function_with_no_remaining_call_is_removed() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let sig = empty_signature(&mut arena);
        let unused =
            arena.alloc(Instr::Function(FunctionInstr { name: "unused".to_string(), signatures: vec![sig] }));
        let mut list: InstrList = [unused].into_iter().collect();

        assert!(run(&mut list, &mut arena, &mut reg));
        assert!(list.is_empty());
    }

    #[test]
    fn a_function_still_called_is_kept() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let sig = empty_signature(&mut arena);
        let used = arena.alloc(Instr::Function(FunctionInstr { name: "used".to_string(), signatures: vec![sig] }));
        let call = arena.alloc(Instr::Call(CallInstr { callee: used, args: Vec::new() }));
        let mut list: InstrList = [used, call].into_iter().collect();

        assert!(!run(&mut list, &mut arena, &mut reg));
        assert_eq!(list.len(), 2);
    }
}
