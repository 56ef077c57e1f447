//! `vec_index_to_swizzle`, `swizzle_swizzle`, and `noop_swizzle`.

use glopt_core::ir::{Instr, SwizzleInstr, SwizzleMask};
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

/// Rewrites a constant-index `DerefArray` of a vector into a 1-wide
/// `Swizzle`.
pub fn vec_index_to_swizzle(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| rewrite_in_list(list, arena, reg))
}

fn rewrite_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let ids = all_expr_ids(list, arena);
    for id in ids {
        if let Instr::DerefArray(d) = arena.get(id).clone() {
            if is_vector(arena, reg, d.array) {
                let const_index = match arena.get(d.index) {
                    Instr::Constant(c) => match c.lanes.first() {
                        Some(glopt_core::types::ConstLane::Int(i)) => Some(*i as u8),
                        Some(glopt_core::types::ConstLane::Uint(u)) => Some(*u as u8),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(lane) = const_index {
                    *arena.get_mut(id) = Instr::Swizzle(SwizzleInstr {
                        source: d.array,
                        mask: SwizzleMask { components: [lane, 0, 0, 0], num_components: 1 },
                        result_type: d.result_type,
                    });
                    changed = true;
                }
            }
        }
    }
    changed
}

fn is_vector(arena: &Arena, reg: &mut TypeRegistry, id: InstrId) -> bool {
    arena
        .get(id)
        .result_type()
        .and_then(|t| reg.get(t).ok().map(|t| t.is_vector()))
        .unwrap_or(false)
}

/// Composes a `Swizzle` of a `Swizzle` into a single `Swizzle` (`a.xy.y`
/// -> `a.y`).
pub fn swizzle_swizzle(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| compose_in_list(list, arena, reg))
}

fn compose_in_list(list: &mut InstrList, arena: &mut Arena, _reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let ids = all_expr_ids(list, arena);
    for id in ids {
        if let Instr::Swizzle(outer) = arena.get(id).clone() {
            if let Instr::Swizzle(inner) = arena.get(outer.source).clone() {
                let mut composed = [0u8; 4];
                for i in 0..outer.mask.num_components as usize {
                    composed[i] = inner.mask.components[outer.mask.components[i] as usize];
                }
                *arena.get_mut(id) = Instr::Swizzle(SwizzleInstr {
                    source: inner.source,
                    mask: SwizzleMask {
                        components: composed,
                        num_components: outer.mask.num_components,
                    },
                    result_type: outer.result_type,
                });
                changed = true;
            }
        }
    }
    changed
}

/// Removes a `Swizzle` whose mask is the identity permutation of its
/// source's full width.
pub fn noop_swizzle(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| strip_in_list(list, arena, reg))
}

fn strip_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let ids = all_expr_ids(list, arena);
    for id in ids {
        if let Instr::Swizzle(s) = arena.get(id).clone() {
            let source_width = arena
                .get(s.source)
                .result_type()
                .and_then(|t| reg.get(t).ok().and_then(|t| t.vector_width()))
                .unwrap_or(0);
            if s.mask.is_identity(source_width) {
                let source = arena.get(s.source).clone();
                *arena.get_mut(id) = source;
                changed = true;
            }
        }
    }
    changed
}

/// Every expression-subtree id reachable from `list`'s statements
/// (including through nested `If`/`Loop` bodies), used by the three
/// swizzle rewrites above to find every `Swizzle`/`DerefArray` node.
fn all_expr_ids(list: &InstrList, arena: &Arena) -> Vec<InstrId> {
    let mut out = Vec::new();
    for id in list.iter() {
        collect(id, arena, &mut out);
    }
    out
}

fn collect(id: InstrId, arena: &Arena, out: &mut Vec<InstrId>) {
    out.push(id);
    glopt_core::visit::for_each_operand(arena.get(id), |c| collect(c, arena, out));
    match arena.get(id) {
        Instr::If(i) => {
            for s in i.then_list.iter() {
                collect(s, arena, out);
            }
            for s in i.else_list.iter() {
                collect(s, arena, out);
            }
        }
        Instr::Loop(l) => {
            for s in l.body.iter() {
                collect(s, arena, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glopt_core::ir::{AssignmentInstr, ConstantInstr, DerefArrayInstr, DerefVariableInstr, VariableInstr};
    use glopt_core::types::{BaseKind, ConstLane};
    use glopt_core::TypeId;

    fn vec3_var(arena: &mut Arena, reg: &mut TypeRegistry, name: &str) -> InstrId {
        let ty = reg.get_instance(BaseKind::Float, 3);
        arena.alloc(Instr::Variable(VariableInstr {
            name: name.to_string(),
            ty,
            storage: StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }))
    }

    fn wrap_stmt(arena: &mut Arena, expr: InstrId, ty: TypeId) -> InstrId {
        let sink = arena.alloc(Instr::Variable(VariableInstr {
            name: "sink".to_string(),
            ty,
            storage: StorageQualifier::Out,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let sink_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: sink, result_type: ty }));
        arena.alloc(Instr::Assignment(AssignmentInstr { lhs: sink_deref, rhs: expr, write_mask: 1, condition: None }))
    }

    #[test]
    fn a_constant_index_into_a_vector_becomes_a_single_component_swizzle() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let v = vec3_var(&mut arena, &mut reg, "v");
        let v_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr {
            var: v,
            result_type: reg.get_instance(BaseKind::Float, 3),
        }));
        let index = arena.alloc(Instr::Constant(ConstantInstr {
            ty: TypeId::INT,
            lanes: smallvec::smallvec![ConstLane::Int(1)],
            elements: Vec::new(),
        }));
        let access = arena.alloc(Instr::DerefArray(DerefArrayInstr { array: v_deref, index, result_type: TypeId::FLOAT }));
        let stmt = wrap_stmt(&mut arena, access, TypeId::FLOAT);
        let mut list: InstrList = [v, stmt].into_iter().collect();

        assert!(vec_index_to_swizzle(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(stmt) else { unreachable!() };
        let Instr::Swizzle(sw) = arena.get(a.rhs) else { panic!("expected a Swizzle") };
        assert_eq!(sw.mask.num_components, 1);
        assert_eq!(sw.mask.components[0], 1);
    }

    #[test]
    fn composing_two_swizzles_collapses_to_one() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let v = vec3_var(&mut arena, &mut reg, "v");
        let vec3_ty = reg.get_instance(BaseKind::Float, 3);
        let v_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: v, result_type: vec3_ty }));
        // v.xy (components [0, 1])
        let inner = arena.alloc(Instr::Swizzle(glopt_core::ir::SwizzleInstr {
            source: v_deref,
            mask: glopt_core::ir::SwizzleMask { components: [0, 1, 0, 0], num_components: 2 },
            result_type: reg.get_instance(BaseKind::Float, 2),
        }));
        // (v.xy).y -> selects component 1 of the inner mask -> v.y
        let outer = arena.alloc(Instr::Swizzle(glopt_core::ir::SwizzleInstr {
            source: inner,
            mask: glopt_core::ir::SwizzleMask { components: [1, 0, 0, 0], num_components: 1 },
            result_type: TypeId::FLOAT,
        }));
        let stmt = wrap_stmt(&mut arena, outer, TypeId::FLOAT);
        let mut list: InstrList = [v, stmt].into_iter().collect();

        assert!(swizzle_swizzle(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(stmt) else { unreachable!() };
        let Instr::Swizzle(sw) = arena.get(a.rhs) else { panic!("expected a Swizzle") };
        assert_eq!(sw.source, v_deref);
        assert_eq!(sw.mask.num_components, 1);
        assert_eq!(sw.mask.components[0], 1);
    }

    #[test]
    fn an_identity_swizzle_is_replaced_by_its_source() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let v = vec3_var(&mut arena, &mut reg, "v");
        let vec3_ty = reg.get_instance(BaseKind::Float, 3);
        let v_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: v, result_type: vec3_ty }));
        let identity = arena.alloc(Instr::Swizzle(glopt_core::ir::SwizzleInstr {
            source: v_deref,
            mask: glopt_core::ir::SwizzleMask { components: [0, 1, 2, 0], num_components: 3 },
            result_type: vec3_ty,
        }));
        let stmt = wrap_stmt(&mut arena, identity, vec3_ty);
        let mut list: InstrList = [v, stmt].into_iter().collect();

        assert!(noop_swizzle(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(stmt) else { unreachable!() };
        assert!(matches!(arena.get(a.rhs), Instr::DerefVariable(d) if d.var == v));
    }
}

