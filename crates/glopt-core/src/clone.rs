//! In-arena subtree cloning.
//!
//! `function_inlining` needs a fresh copy of a callee's body (and every
//! expression subtree inside it) for each call site; a cloned node is a
//! brand-new arena entry, never a second reference to the original, so
//! each inlined copy can be rewritten (e.g. substituting parameters)
//! independently of the others and of the original signature.

use std::collections::HashMap;

use crate::arena::{Arena, InstrId};
use crate::ir::*;
use crate::list::InstrList;

/// Tracks original->clone mappings for one cloning pass so that a node
/// referenced from two places in the cloned subtree (e.g. a `Variable`
/// read twice) maps to the same clone rather than being duplicated.
#[derive(Default)]
pub struct CloneMap {
    mapped: HashMap<InstrId, InstrId>,
}

impl CloneMap {
    pub fn new() -> Self {
        CloneMap::default()
    }

    pub fn get(&self, original: InstrId) -> Option<InstrId> {
        self.mapped.get(&original).copied()
    }

    /// Pre-seeds the map, e.g. to redirect a cloned body's references to
    /// a parameter Variable onto an already-allocated temporary.
    pub fn bind(&mut self, original: InstrId, replacement: InstrId) {
        self.mapped.insert(original, replacement);
    }

    pub fn clone_instr(&mut self, arena: &mut Arena, id: InstrId) -> InstrId {
        if let Some(existing) = self.mapped.get(&id) {
            return *existing;
        }
        let cloned = match arena.get(id).clone() {
            Instr::Variable(v) => Instr::Variable(v),
            Instr::Function(f) => Instr::Function(f),
            Instr::FunctionSignature(sig) => Instr::FunctionSignature(FunctionSignatureInstr {
                return_type: sig.return_type,
                params: sig.params.iter().map(|&p| self.clone_instr(arena, p)).collect(),
                body: self.clone_list(arena, &sig.body),
                is_defined: sig.is_defined,
                is_built_in: sig.is_built_in,
                parent: sig.parent,
            }),
            Instr::Expression(e) => Instr::Expression(ExpressionInstr {
                op: e.op,
                result_type: e.result_type,
                operands: e.operands.iter().map(|&o| self.clone_instr(arena, o)).collect(),
            }),
            Instr::Texture(t) => Instr::Texture(TextureInstr {
                op: t.op,
                sampler: self.clone_instr(arena, t.sampler),
                coordinate: self.clone_instr(arena, t.coordinate),
                offset: t.offset,
                projector: t.projector.map(|p| self.clone_instr(arena, p)),
                shadow_comparator: t.shadow_comparator.map(|s| self.clone_instr(arena, s)),
                lod: match t.lod {
                    LodInfo::None => LodInfo::None,
                    LodInfo::Bias(b) => LodInfo::Bias(self.clone_instr(arena, b)),
                    LodInfo::Lod(l) => LodInfo::Lod(self.clone_instr(arena, l)),
                    LodInfo::Grad { d_pdx, d_pdy } => LodInfo::Grad {
                        d_pdx: self.clone_instr(arena, d_pdx),
                        d_pdy: self.clone_instr(arena, d_pdy),
                    },
                },
                result_type: t.result_type,
            }),
            Instr::Swizzle(s) => Instr::Swizzle(SwizzleInstr {
                source: self.clone_instr(arena, s.source),
                mask: s.mask,
                result_type: s.result_type,
            }),
            Instr::DerefVariable(d) => Instr::DerefVariable(DerefVariableInstr {
                var: self.clone_instr(arena, d.var),
                result_type: d.result_type,
            }),
            Instr::DerefArray(d) => Instr::DerefArray(DerefArrayInstr {
                array: self.clone_instr(arena, d.array),
                index: self.clone_instr(arena, d.index),
                result_type: d.result_type,
            }),
            Instr::DerefRecord(d) => Instr::DerefRecord(DerefRecordInstr {
                record: self.clone_instr(arena, d.record),
                field: d.field,
                result_type: d.result_type,
            }),
            Instr::Assignment(a) => Instr::Assignment(AssignmentInstr {
                lhs: self.clone_instr(arena, a.lhs),
                rhs: self.clone_instr(arena, a.rhs),
                write_mask: a.write_mask,
                condition: a.condition.map(|c| self.clone_instr(arena, c)),
            }),
            Instr::Constant(c) => Instr::Constant(ConstantInstr {
                ty: c.ty,
                lanes: c.lanes,
                elements: c.elements.iter().map(|&e| self.clone_instr(arena, e)).collect(),
            }),
            Instr::Call(c) => Instr::Call(CallInstr {
                callee: c.callee,
                args: c.args.iter().map(|&a| self.clone_instr(arena, a)).collect(),
            }),
            Instr::Return(r) => Instr::Return(ReturnInstr {
                value: r.value.map(|v| self.clone_instr(arena, v)),
            }),
            Instr::Discard(d) => Instr::Discard(DiscardInstr {
                condition: d.condition.map(|c| self.clone_instr(arena, c)),
            }),
            Instr::If(i) => Instr::If(IfInstr {
                condition: self.clone_instr(arena, i.condition),
                then_list: self.clone_list(arena, &i.then_list),
                else_list: self.clone_list(arena, &i.else_list),
            }),
            Instr::Loop(l) => Instr::Loop(LoopInstr {
                body: self.clone_list(arena, &l.body),
                counter: l.counter.map(|c| self.clone_instr(arena, c)),
                from: l.from.map(|c| self.clone_instr(arena, c)),
                to: l.to.map(|c| self.clone_instr(arena, c)),
                increment: l.increment.map(|c| self.clone_instr(arena, c)),
            }),
            Instr::LoopJump(j) => Instr::LoopJump(j),
        };
        let new_id = arena.alloc(cloned);
        self.mapped.insert(id, new_id);
        new_id
    }

    pub fn clone_list(&mut self, arena: &mut Arena, list: &InstrList) -> InstrList {
        list.iter().map(|id| self.clone_instr(arena, id)).collect()
    }
}

/// Clones a single subtree with a fresh [`CloneMap`].
pub fn clone_instr(arena: &mut Arena, id: InstrId) -> InstrId {
    CloneMap::new().clone_instr(arena, id)
}

/// Clones a whole statement list with a fresh [`CloneMap`].
pub fn clone_list(arena: &mut Arena, list: &InstrList) -> InstrList {
    CloneMap::new().clone_list(arena, list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_id::TypeId;
    use crate::types::ConstLane;

    #[test]
    fn clone_produces_fresh_ids_for_each_reference() {
        let mut arena = Arena::new();
        let one = arena.alloc(Instr::Constant(ConstantInstr {
            ty: TypeId::FLOAT,
            lanes: smallvec::smallvec![ConstLane::Float(1.0)],
            elements: Vec::new(),
        }));
        let add = arena.alloc(Instr::Expression(ExpressionInstr {
            op: ExprOp::Binary(crate::ops::BinaryOp::Add),
            result_type: TypeId::FLOAT,
            operands: smallvec::smallvec![one, one],
        }));
        let cloned = clone_instr(&mut arena, add);
        assert_ne!(cloned, add);
        let Instr::Expression(cloned_expr) = arena.get(cloned) else {
            panic!("expected Expression");
        };
        // Both operand references resolve to the SAME clone of `one`.
        assert_eq!(cloned_expr.operands[0], cloned_expr.operands[1]);
        assert_ne!(cloned_expr.operands[0], one);
    }
}
