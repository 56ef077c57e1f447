//! Applies typed algebraic identities: `x+0`, `x*1`, `x*0`, `x-x`,
//! `x&&true`, `x||false`, double negation.

use glopt_core::ir::{ConstantInstr, ExprOp, Instr};
use glopt_core::ops::{BinaryOp, UnaryOp};
use glopt_core::types::{BaseKind, ConstLane};
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn run(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| simplify_in_list(list, arena, reg))
}

fn simplify_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let ids = all_expr_ids(list, arena);
    for id in ids {
        if let Some(replacement) = try_simplify(id, arena) {
            match replacement {
                Replacement::SameAs(src) => *arena.get_mut(id) = arena.get(src).clone(),
                Replacement::Zero(ty) => *arena.get_mut(id) = zero_constant(ty, reg),
            }
            changed = true;
        }
    }
    changed
}

enum Replacement {
    SameAs(InstrId),
    Zero(glopt_core::TypeId),
}

fn try_simplify(id: InstrId, arena: &Arena) -> Option<Replacement> {
    let Instr::Expression(e) = arena.get(id) else {
        return None;
    };
    match e.op {
        ExprOp::Unary(UnaryOp::LogicNot) => {
            let inner = e.operands[0];
            if let Instr::Expression(ie) = arena.get(inner) {
                if matches!(ie.op, ExprOp::Unary(UnaryOp::LogicNot)) {
                    return Some(Replacement::SameAs(ie.operands[0]));
                }
            }
            None
        }
        ExprOp::Unary(UnaryOp::Neg) => {
            let inner = e.operands[0];
            if let Instr::Expression(ie) = arena.get(inner) {
                if matches!(ie.op, ExprOp::Unary(UnaryOp::Neg)) {
                    return Some(Replacement::SameAs(ie.operands[0]));
                }
            }
            None
        }
        ExprOp::Binary(op) => try_simplify_binary(op, e.operands[0], e.operands[1], e.result_type, arena),
        _ => None,
    }
}

fn try_simplify_binary(
    op: BinaryOp,
    lhs: InstrId,
    rhs: InstrId,
    result_type: glopt_core::TypeId,
    arena: &Arena,
) -> Option<Replacement> {
    let lhs_zero = is_scalar_constant(arena, lhs, |l| matches!(l, ConstLane::Float(0.0) | ConstLane::Int(0)));
    let rhs_zero = is_scalar_constant(arena, rhs, |l| matches!(l, ConstLane::Float(0.0) | ConstLane::Int(0)));
    let rhs_one = is_scalar_constant(arena, rhs, |l| matches!(l, ConstLane::Float(1.0) | ConstLane::Int(1)));
    let rhs_true = is_scalar_constant(arena, rhs, |l| matches!(l, ConstLane::Bool(true)));
    let rhs_false = is_scalar_constant(arena, rhs, |l| matches!(l, ConstLane::Bool(false)));

    match op {
        BinaryOp::Add if rhs_zero => Some(Replacement::SameAs(lhs)),
        BinaryOp::Add if lhs_zero => Some(Replacement::SameAs(rhs)),
        BinaryOp::Sub if rhs_zero => Some(Replacement::SameAs(lhs)),
        BinaryOp::Sub if same_operand(arena, lhs, rhs) => Some(Replacement::Zero(result_type)),
        BinaryOp::Mul if rhs_one => Some(Replacement::SameAs(lhs)),
        BinaryOp::LogicAnd if rhs_true => Some(Replacement::SameAs(lhs)),
        BinaryOp::LogicOr if rhs_false => Some(Replacement::SameAs(lhs)),
        _ => None,
    }
}

/// `x - x` only folds when both sides are syntactically the same
/// dereference of the same variable -- not merely structurally equal
/// expressions, which could have different side effects or values.
fn same_operand(arena: &Arena, lhs: InstrId, rhs: InstrId) -> bool {
    matches!(
        (arena.get(lhs), arena.get(rhs)),
        (Instr::DerefVariable(a), Instr::DerefVariable(b)) if a.var == b.var
    )
}

fn zero_constant(ty: glopt_core::TypeId, reg: &mut TypeRegistry) -> Instr {
    let base = reg.base_kind(ty).ok().flatten().unwrap_or(BaseKind::Float);
    let width = reg.components(ty).unwrap_or(1).max(1) as usize;
    let lane = match base {
        BaseKind::Bool => ConstLane::Bool(false),
        BaseKind::Int => ConstLane::Int(0),
        BaseKind::Uint => ConstLane::Uint(0),
        BaseKind::Float => ConstLane::Float(0.0),
    };
    Instr::Constant(ConstantInstr {
        ty,
        lanes: std::iter::repeat(lane).take(width.min(4)).collect(),
        elements: vec![],
    })
}

fn is_scalar_constant(arena: &Arena, id: InstrId, pred: impl Fn(&ConstLane) -> bool) -> bool {
    match arena.get(id) {
        Instr::Constant(c) => c.lanes.len() == 1 && pred(&c.lanes[0]),
        _ => false,
    }
}

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
    use glopt_core::ir::{AssignmentInstr, DerefVariableInstr, ExpressionInstr, VariableInstr};
    use glopt_core::ops::BinaryOp;
    use glopt_core::{TypeId, TypeRegistry};

    fn float_var(arena: &mut Arena, name: &str) -> InstrId {
        arena.alloc(Instr::Variable(VariableInstr {
            name: name.to_string(),
            ty: TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }))
    }

    fn deref(arena: &mut Arena, var: InstrId) -> InstrId {
        arena.alloc(Instr::DerefVariable(DerefVariableInstr { var, result_type: TypeId::FLOAT }))
    }

    #[test]
    fn same_variable_subtraction_folds_to_zero() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let x = float_var(&mut arena, "x");
        let sub = arena.alloc(Instr::Expression(ExpressionInstr {
            op: ExprOp::Binary(BinaryOp::Sub),
            result_type: TypeId::FLOAT,
            operands: smallvec::smallvec![deref(&mut arena, x), deref(&mut arena, x)],
        }));
        let out = float_var(&mut arena, "out");
        let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, out),
            rhs: sub,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [x, out, assign].into_iter().collect();

        assert!(run(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(assign) else { unreachable!() };
        assert!(matches!(arena.get(a.rhs), Instr::Constant(c) if c.lanes[0] == glopt_core::ConstLane::Float(0.0)));
    }

    #[test]
    fn adding_zero_is_a_no_op_rewrite() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let x = float_var(&mut arena, "x");
        let zero = arena.alloc(Instr::Constant(glopt_core::ir::ConstantInstr {
            ty: TypeId::FLOAT,
            lanes: smallvec::smallvec![glopt_core::ConstLane::Float(0.0)],
            elements: Vec::new(),
        }));
        let add = arena.alloc(Instr::Expression(ExpressionInstr {
            op: ExprOp::Binary(BinaryOp::Add),
            result_type: TypeId::FLOAT,
            operands: smallvec::smallvec![deref(&mut arena, x), zero],
        }));
        let out = float_var(&mut arena, "out");
        let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: deref(&mut arena, out),
            rhs: add,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [x, out, assign].into_iter().collect();

        assert!(run(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(assign) else { unreachable!() };
        assert!(matches!(arena.get(a.rhs), Instr::DerefVariable(d) if d.var == x));
    }
}
