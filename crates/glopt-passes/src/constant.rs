//! `constant_propagation`, `constant_variable_unlinked`, and
//! `constant_folding`.
//!
//! These three passes are distinct rewrites in the original's fixed-point
//! order but share the same core arithmetic, so they live in one file:
//! propagation substitutes reads of a variable known (locally, or
//! globally for the `_unlinked` variant) to hold a constant; folding
//! evaluates `Expression` nodes whose operands are already `Constant`.

use std::collections::HashMap;

use glopt_core::ir::*;
use glopt_core::ops::{BinaryOp, UnaryOp};
use glopt_core::types::ConstLane;
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

use crate::util;

pub fn propagate(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| propagate_in_list(list, arena, reg))
}

fn propagate_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let mut known: HashMap<InstrId, InstrId> = HashMap::new();
    for id in list.iter() {
        // Substitute reads inside this statement's operand tree using
        // what's known so far (definitions made earlier in the block).
        changed |= substitute_reads(id, arena, &known);

        if let Instr::Assignment(a) = arena.get(id) {
            let (lhs, rhs, write_mask) = (a.lhs, a.rhs, a.write_mask);
            if let Instr::DerefVariable(d) = arena.get(lhs) {
                let var = d.var;
                let full = match arena.get(var) {
                    Instr::Variable(v) => reg.get(v.ty).ok().and_then(|t| t.vector_width()).map(|w| util::full_mask(w)),
                    _ => None,
                };
                let is_full_write = full == Some(write_mask);
                if is_full_write && matches!(arena.get(rhs), Instr::Constant(_)) {
                    known.insert(var, rhs);
                } else {
                    known.remove(&var);
                }
            }
        }
    }
    changed
}

/// Globally scoped variant: a variable written exactly once, anywhere in
/// the tree, with a full-mask constant assignment, has every read of it
/// (anywhere) replaced by that constant.
pub fn variable_unlinked(list: &mut InstrList, arena: &mut Arena, _reg: &mut TypeRegistry) -> bool {
    let mut writes: HashMap<InstrId, (u32, Option<InstrId>)> = HashMap::new();
    count_writes(list, arena, &mut writes);

    let single_constant: HashMap<InstrId, InstrId> = writes
        .into_iter()
        .filter_map(|(var, (count, constant))| {
            if count == 1 {
                constant.map(|c| (var, c))
            } else {
                None
            }
        })
        .collect();

    if single_constant.is_empty() {
        return false;
    }
    let mut changed = false;
    for id in list.iter() {
        changed |= substitute_reads_recursive(id, arena, &single_constant);
    }
    changed
}

fn count_writes(list: &InstrList, arena: &Arena, out: &mut HashMap<InstrId, (u32, Option<InstrId>)>) {
    for id in list.iter() {
        match arena.get(id) {
            Instr::Assignment(a) => {
                if let Instr::DerefVariable(d) = arena.get(a.lhs) {
                    let entry = out.entry(d.var).or_insert((0, None));
                    entry.0 += 1;
                    entry.1 = matches!(arena.get(a.rhs), Instr::Constant(_)).then_some(a.rhs);
                }
            }
            Instr::If(i) => {
                count_writes(&i.then_list, arena, out);
                count_writes(&i.else_list, arena, out);
            }
            Instr::Loop(l) => count_writes(&l.body, arena, out),
            Instr::FunctionSignature(sig) => count_writes(&sig.body, arena, out),
            Instr::Function(f) => {
                for &sig_id in &f.signatures {
                    if let Instr::FunctionSignature(sig) = arena.get(sig_id) {
                        count_writes(&sig.body, arena, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Rewrites reads of a known-constant variable within `id`'s operand
/// tree. When `id` is itself an `Assignment`, its own `lhs` is excluded
/// -- substituting it would replace the destination being written with
/// the constant it's being assigned, corrupting the statement (mirrors
/// `dead_code::collect_reads`'s same exclusion).
fn substitute_reads(id: InstrId, arena: &mut Arena, known: &HashMap<InstrId, InstrId>) -> bool {
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
            if let Some(&constant_id) = known.get(&d.var) {
                let constant = arena.get(constant_id).clone();
                *arena.get_mut(child) = constant;
                changed = true;
                continue;
            }
        }
        changed |= substitute_reads(child, arena, known);
    }
    changed
}

fn substitute_reads_recursive(id: InstrId, arena: &mut Arena, known: &HashMap<InstrId, InstrId>) -> bool {
    let mut changed = substitute_reads(id, arena, known);
    match arena.get(id).clone() {
        Instr::If(i) => {
            for stmt in i.then_list.iter() {
                changed |= substitute_reads_recursive(stmt, arena, known);
            }
            for stmt in i.else_list.iter() {
                changed |= substitute_reads_recursive(stmt, arena, known);
            }
        }
        Instr::Loop(l) => {
            for stmt in l.body.iter() {
                changed |= substitute_reads_recursive(stmt, arena, known);
            }
        }
        Instr::FunctionSignature(sig) => {
            for stmt in sig.body.iter() {
                changed |= substitute_reads_recursive(stmt, arena, known);
            }
        }
        Instr::Function(f) => {
            for sig_id in f.signatures {
                changed |= substitute_reads_recursive(sig_id, arena, known);
            }
        }
        _ => {}
    }
    changed
}

pub fn fold(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    util::visit_lists_mut(list, arena, &mut |list, arena| fold_in_list(list, arena, reg))
}

fn fold_in_list(list: &mut InstrList, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    for id in list.iter() {
        changed |= fold_instr(id, arena, reg);
    }
    changed
}

fn fold_instr(id: InstrId, arena: &mut Arena, reg: &mut TypeRegistry) -> bool {
    let mut changed = false;
    let children: Vec<InstrId> = {
        let mut out = Vec::new();
        glopt_core::visit::for_each_operand(arena.get(id), |c| out.push(c));
        out
    };
    for child in &children {
        changed |= fold_instr(*child, arena, reg);
    }

    if let Instr::Expression(e) = arena.get(id).clone() {
        let operand_lanes: Option<Vec<Vec<ConstLane>>> = e
            .operands
            .iter()
            .map(|&o| match arena.get(o) {
                Instr::Constant(c) if c.elements.is_empty() => Some(c.lanes.to_vec()),
                _ => None,
            })
            .collect();
        if let Some(lanes) = operand_lanes {
            let folded = match e.op {
                ExprOp::Unary(op) => fold_unary(op, &lanes[0]),
                ExprOp::Binary(op) => fold_binary(op, &lanes[0], &lanes[1]),
            };
            if let Some(result_lanes) = folded {
                *arena.get_mut(id) = Instr::Constant(ConstantInstr {
                    ty: e.result_type,
                    lanes: result_lanes.into(),
                    elements: Vec::new(),
                });
                changed = true;
            }
        }
    }
    let _ = reg;
    changed
}

fn fold_unary(op: UnaryOp, a: &[ConstLane]) -> Option<Vec<ConstLane>> {
    let per_lane = |f: &dyn Fn(f64) -> f64| -> Vec<ConstLane> {
        a.iter().map(|l| ConstLane::Float(f(l.as_f64().unwrap_or(0.0)))).collect()
    };
    Some(match op {
        UnaryOp::Neg => a
            .iter()
            .map(|l| match l {
                ConstLane::Float(f) => ConstLane::Float(-f),
                ConstLane::Int(i) => ConstLane::Int(-i),
                other => other.clone(),
            })
            .collect(),
        UnaryOp::Abs => per_lane(&f64::abs),
        UnaryOp::Sign => per_lane(&f64::signum),
        UnaryOp::Sqrt => per_lane(&f64::sqrt),
        UnaryOp::Rsq => per_lane(&|x| 1.0 / x.sqrt()),
        UnaryOp::Rcp => per_lane(&|x| 1.0 / x),
        UnaryOp::Exp => per_lane(&f64::exp),
        UnaryOp::Log => per_lane(&f64::ln),
        UnaryOp::Exp2 => per_lane(&f64::exp2),
        UnaryOp::Log2 => per_lane(&f64::log2),
        UnaryOp::Trunc => per_lane(&f64::trunc),
        UnaryOp::Ceil => per_lane(&f64::ceil),
        UnaryOp::Floor => per_lane(&f64::floor),
        UnaryOp::Fract => per_lane(&|x| x.fract()),
        UnaryOp::Sin => per_lane(&f64::sin),
        UnaryOp::Cos => per_lane(&f64::cos),
        UnaryOp::LogicNot => a
            .iter()
            .map(|l| match l {
                ConstLane::Bool(b) => ConstLane::Bool(!b),
                other => other.clone(),
            })
            .collect(),
        UnaryOp::BitNot => a
            .iter()
            .map(|l| match l {
                ConstLane::Int(i) => ConstLane::Int(!i),
                ConstLane::Uint(u) => ConstLane::Uint(!u),
                other => other.clone(),
            })
            .collect(),
        UnaryOp::F2I => a.iter().map(|l| ConstLane::Int(l.as_f64().unwrap_or(0.0) as i32)).collect(),
        UnaryOp::I2F | UnaryOp::U2F | UnaryOp::B2F => {
            a.iter().map(|l| ConstLane::Float(l.as_f64().unwrap_or(0.0))).collect()
        }
        UnaryOp::F2B | UnaryOp::I2B => a.iter().map(|l| ConstLane::Bool(l.as_f64().unwrap_or(0.0) != 0.0)).collect(),
        UnaryOp::B2I => a
            .iter()
            .map(|l| match l {
                ConstLane::Bool(b) => ConstLane::Int(*b as i32),
                other => other.clone(),
            })
            .collect(),
        UnaryOp::DFdx | UnaryOp::DFdy => return None,
    })
}

fn fold_binary(op: BinaryOp, a: &[ConstLane], b: &[ConstLane]) -> Option<Vec<ConstLane>> {
    let width = a.len().max(b.len());
    let lane = |v: &[ConstLane], i: usize| -> &ConstLane {
        if v.len() == 1 {
            &v[0]
        } else {
            &v[i]
        }
    };

    if matches!(op, BinaryOp::Dot) {
        let dot: f64 = (0..width)
            .map(|i| lane(a, i).as_f64().unwrap_or(0.0) * lane(b, i).as_f64().unwrap_or(0.0))
            .sum();
        return Some(vec![ConstLane::Float(dot)]);
    }
    if matches!(op, BinaryOp::Cross) {
        if a.len() != 3 || b.len() != 3 {
            return None;
        }
        let ax = a[0].as_f64()?;
        let ay = a[1].as_f64()?;
        let az = a[2].as_f64()?;
        let bx = b[0].as_f64()?;
        let by = b[1].as_f64()?;
        let bz = b[2].as_f64()?;
        return Some(vec![
            ConstLane::Float(ay * bz - az * by),
            ConstLane::Float(az * bx - ax * bz),
            ConstLane::Float(ax * by - ay * bx),
        ]);
    }

    let mut out = Vec::with_capacity(width);
    for i in 0..width {
        let la = lane(a, i);
        let lb = lane(b, i);
        out.push(fold_binary_scalar(op, la, lb)?);
    }
    Some(out)
}

fn fold_binary_scalar(op: BinaryOp, a: &ConstLane, b: &ConstLane) -> Option<ConstLane> {
    use ConstLane::*;
    Some(match (op, a, b) {
        (BinaryOp::Add, Int(x), Int(y)) => Int(x.wrapping_add(*y)),
        (BinaryOp::Add, Uint(x), Uint(y)) => Uint(x.wrapping_add(*y)),
        (BinaryOp::Add, _, _) => Float(a.as_f64()? + b.as_f64()?),
        (BinaryOp::Sub, Int(x), Int(y)) => Int(x.wrapping_sub(*y)),
        (BinaryOp::Sub, Uint(x), Uint(y)) => Uint(x.wrapping_sub(*y)),
        (BinaryOp::Sub, _, _) => Float(a.as_f64()? - b.as_f64()?),
        (BinaryOp::Mul, Int(x), Int(y)) => Int(x.wrapping_mul(*y)),
        (BinaryOp::Mul, Uint(x), Uint(y)) => Uint(x.wrapping_mul(*y)),
        (BinaryOp::Mul, _, _) => Float(a.as_f64()? * b.as_f64()?),
        (BinaryOp::Div, Int(x), Int(y)) if *y != 0 => Int(x / y),
        (BinaryOp::Div, _, _) => Float(a.as_f64()? / b.as_f64()?),
        (BinaryOp::Mod, Int(x), Int(y)) if *y != 0 => Int(x.rem_euclid(*y)),
        (BinaryOp::Mod, _, _) => Float(a.as_f64()?.rem_euclid(b.as_f64()?)),
        (BinaryOp::Min, _, _) => Float(a.as_f64()?.min(b.as_f64()?)),
        (BinaryOp::Max, _, _) => Float(a.as_f64()?.max(b.as_f64()?)),
        (BinaryOp::Pow, _, _) => Float(a.as_f64()?.powf(b.as_f64()?)),
        (BinaryOp::Lt, _, _) => Bool(a.as_f64()? < b.as_f64()?),
        (BinaryOp::Gt, _, _) => Bool(a.as_f64()? > b.as_f64()?),
        (BinaryOp::Le, _, _) => Bool(a.as_f64()? <= b.as_f64()?),
        (BinaryOp::Ge, _, _) => Bool(a.as_f64()? >= b.as_f64()?),
        (BinaryOp::Eq, _, _) => Bool(a == b),
        (BinaryOp::Ne, _, _) => Bool(a != b),
        (BinaryOp::Shl, Int(x), Int(y)) => Int(x.wrapping_shl(*y as u32)),
        (BinaryOp::Shr, Int(x), Int(y)) => Int(x.wrapping_shr(*y as u32)),
        (BinaryOp::BitAnd, Int(x), Int(y)) => Int(x & y),
        (BinaryOp::BitOr, Int(x), Int(y)) => Int(x | y),
        (BinaryOp::BitXor, Int(x), Int(y)) => Int(x ^ y),
        (BinaryOp::LogicAnd, Bool(x), Bool(y)) => Bool(*x && *y),
        (BinaryOp::LogicOr, Bool(x), Bool(y)) => Bool(*x || *y),
        (BinaryOp::LogicXor, Bool(x), Bool(y)) => Bool(*x ^ *y),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glopt_core::ir::{AssignmentInstr, DerefVariableInstr, VariableInstr};

    fn float_const(arena: &mut Arena, v: f64) -> InstrId {
        arena.alloc(Instr::Constant(ConstantInstr {
            ty: glopt_core::TypeId::FLOAT,
            lanes: smallvec::smallvec![ConstLane::Float(v)],
            elements: Vec::new(),
        }))
    }

    #[test]
    fn fold_evaluates_constant_addition() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let a = float_const(&mut arena, 2.0);
        let b = float_const(&mut arena, 3.0);
        let add = arena.alloc(Instr::Expression(ExpressionInstr {
            op: ExprOp::Binary(BinaryOp::Add),
            result_type: glopt_core::TypeId::FLOAT,
            operands: smallvec::smallvec![a, b],
        }));
        let mut list: InstrList = [add].into_iter().collect();

        assert!(fold(&mut list, &mut arena, &mut reg));
        assert!(matches!(arena.get(add), Instr::Constant(c) if c.lanes[0] == ConstLane::Float(5.0)));
    }

    #[test]
    fn propagate_substitutes_a_locally_known_constant() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let x = arena.alloc(Instr::Variable(VariableInstr {
            name: "x".to_string(),
            ty: glopt_core::TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let x_deref = |arena: &mut Arena| {
            arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: x, result_type: glopt_core::TypeId::FLOAT }))
        };
        let one = float_const(&mut arena, 1.0);
        let assign_x = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: x_deref(&mut arena),
            rhs: one,
            write_mask: 1,
            condition: None,
        }));
        let y = arena.alloc(Instr::Variable(VariableInstr {
            name: "y".to_string(),
            ty: glopt_core::TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let read_x = x_deref(&mut arena);
        let y_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: y, result_type: glopt_core::TypeId::FLOAT }));
        let assign_y = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: y_deref,
            rhs: read_x,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [x, assign_x, y, assign_y].into_iter().collect();

        assert!(propagate(&mut list, &mut arena, &mut reg));
        let Instr::Assignment(a) = arena.get(assign_y) else { unreachable!() };
        assert!(matches!(arena.get(a.rhs), Instr::Constant(c) if c.lanes[0] == ConstLane::Float(1.0)));
    }

    #[test]
    fn propagate_does_not_corrupt_a_writes_own_lhs_with_its_prior_constant() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let x = arena.alloc(Instr::Variable(VariableInstr {
            name: "x".to_string(),
            ty: glopt_core::TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let x_deref = |arena: &mut Arena| {
            arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: x, result_type: glopt_core::TypeId::FLOAT }))
        };
        let one = float_const(&mut arena, 1.0);
        let assign_const = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: x_deref(&mut arena),
            rhs: one,
            write_mask: 1,
            condition: None,
        }));
        let z = arena.alloc(Instr::Variable(VariableInstr {
            name: "z".to_string(),
            ty: glopt_core::TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Temporary,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let z_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: z, result_type: glopt_core::TypeId::FLOAT }));
        // Later write to the same variable, now from a non-constant
        // source: while `known` still maps x -> 1.0 at the time this
        // statement is processed, the write's own lhs must stay `x`.
        let assign_non_const = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: x_deref(&mut arena),
            rhs: z_deref,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [x, z, assign_const, assign_non_const].into_iter().collect();

        propagate(&mut list, &mut arena, &mut reg);

        let Instr::Assignment(a) = arena.get(assign_non_const) else { unreachable!() };
        assert!(
            matches!(arena.get(a.lhs), Instr::DerefVariable(d) if d.var == x),
            "the second write's own lhs must stay a read of `x`, not get replaced by the prior constant"
        );
        assert!(matches!(arena.get(a.rhs), Instr::DerefVariable(d) if d.var == z));
    }

    #[test]
    fn variable_unlinked_does_not_corrupt_the_defining_assignments_own_lhs() {
        let mut arena = Arena::new();
        let mut reg = TypeRegistry::new();
        let f = arena.alloc(Instr::Variable(VariableInstr {
            name: "f".to_string(),
            ty: glopt_core::TypeId::FLOAT,
            storage: glopt_core::ir::StorageQualifier::Out,
            interpolation: glopt_core::ir::Interpolation::Smooth,
            centroid: false,
            invariant: false,
        }));
        let f_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: f, result_type: glopt_core::TypeId::FLOAT }));
        let five = float_const(&mut arena, 5.0);
        let assign_f = arena.alloc(Instr::Assignment(AssignmentInstr {
            lhs: f_deref,
            rhs: five,
            write_mask: 1,
            condition: None,
        }));
        let mut list: InstrList = [f, assign_f].into_iter().collect();

        variable_unlinked(&mut list, &mut arena, &mut reg);

        let Instr::Assignment(a) = arena.get(assign_f) else { unreachable!() };
        assert!(
            matches!(arena.get(a.lhs), Instr::DerefVariable(d) if d.var == f),
            "the defining assignment's own lhs must stay a `DerefVariable`, not become the constant it assigns"
        );
    }

    proptest::proptest! {
        /// Folding `a <op> b` for two float constants always agrees with
        /// plain `f64` arithmetic, for every arithmetic binary op.
        #[test]
        fn folding_a_binary_float_expression_matches_f64_arithmetic(
            a in -1.0e6f64..1.0e6,
            b in -1.0e6f64..1.0e6,
        ) {
            for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Min, BinaryOp::Max] {
                let mut arena = Arena::new();
                let mut reg = TypeRegistry::new();
                let ca = float_const(&mut arena, a);
                let cb = float_const(&mut arena, b);
                let expr = arena.alloc(Instr::Expression(ExpressionInstr {
                    op: ExprOp::Binary(op),
                    result_type: glopt_core::TypeId::FLOAT,
                    operands: smallvec::smallvec![ca, cb],
                }));
                let mut list: InstrList = [expr].into_iter().collect();

                proptest::prop_assert!(fold(&mut list, &mut arena, &mut reg));
                let expected = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Min => a.min(b),
                    BinaryOp::Max => a.max(b),
                    _ => unreachable!(),
                };
                match arena.get(expr) {
                    Instr::Constant(c) => match c.lanes[0] {
                        ConstLane::Float(got) => proptest::prop_assert_eq!(got, expected),
                        _ => proptest::prop_assert!(false, "expected a float lane"),
                    },
                    _ => proptest::prop_assert!(false, "expected the expression to fold to a Constant"),
                }
            }
        }
    }
}
