//! Structural validator enforcing the five invariants of the data model:
//! rvalue type agreement, single-list membership, scope-resolved
//! `DerefVariable`, write-mask/lhs-width consistency, and `Call`
//! argument/signature matching.

use std::collections::HashSet;

use crate::arena::{Arena, InstrId};
use crate::error::{CompileError, Result};
use crate::ir::*;
use crate::list::InstrList;
use crate::ops::{binary_result_type, unary_result_type};
use crate::type_id::TypeRegistry;

fn malformed(path: &str, message: impl Into<String>) -> CompileError {
    CompileError::IRMalformed {
        path: path.to_string(),
        message: message.into(),
    }
}

pub struct Validator<'a> {
    arena: &'a Arena,
    reg: &'a mut TypeRegistry,
    seen_statements: HashSet<InstrId>,
}

impl<'a> Validator<'a> {
    pub fn new(arena: &'a Arena, reg: &'a mut TypeRegistry) -> Self {
        Validator {
            arena,
            reg,
            seen_statements: HashSet::new(),
        }
    }

    pub fn validate_list(&mut self, list: &InstrList) -> Result<()> {
        for id in list.iter() {
            self.validate_statement(id)?;
        }
        Ok(())
    }

    fn validate_statement(&mut self, id: InstrId) -> Result<()> {
        if !self.seen_statements.insert(id) {
            return Err(malformed(
                &id.to_string(),
                "instruction appears in more than one list",
            ));
        }
        let instr = self.arena.get(id);
        match instr {
            Instr::Variable(_) => {}
            Instr::Function(f) => {
                for &sig in &f.signatures {
                    self.validate_statement(sig)?;
                }
            }
            Instr::FunctionSignature(sig) => {
                for &p in &sig.params {
                    if !matches!(self.arena.get(p), Instr::Variable(_)) {
                        return Err(malformed(&id.to_string(), "signature parameter is not a Variable"));
                    }
                }
                self.validate_list(&sig.body)?;
            }
            Instr::Assignment(a) => self.validate_assignment(id, a)?,
            Instr::Call(c) => self.validate_call(id, c)?,
            Instr::Return(r) => {
                if let Some(v) = r.value {
                    self.validate_rvalue(v)?;
                }
            }
            Instr::Discard(d) => {
                if let Some(c) = d.condition {
                    self.validate_rvalue(c)?;
                }
            }
            Instr::If(i) => {
                let cond_ty = self.validate_rvalue(i.condition)?;
                if self.reg.base_kind(cond_ty)? != Some(crate::types::BaseKind::Bool) {
                    return Err(malformed(&id.to_string(), "If condition is not bool"));
                }
                self.validate_list(&i.then_list)?;
                self.validate_list(&i.else_list)?;
            }
            Instr::Loop(l) => {
                for c in [l.counter, l.from, l.to, l.increment].into_iter().flatten() {
                    self.validate_rvalue(c)?;
                }
                self.validate_list(&l.body)?;
            }
            Instr::LoopJump(_) => {}
            other => {
                return Err(malformed(
                    &id.to_string(),
                    format!("{} cannot appear as a top-level statement", other.kind_name()),
                ));
            }
        }
        Ok(())
    }

    fn validate_assignment(&mut self, id: InstrId, a: &AssignmentInstr) -> Result<()> {
        let lhs_ty = self.validate_rvalue(a.lhs)?;
        let rhs_ty = self.validate_rvalue(a.rhs)?;
        if let Some(c) = a.condition {
            self.validate_rvalue(c)?;
        }
        let lhs_width = self
            .reg
            .get(lhs_ty)?
            .vector_width()
            .ok_or_else(|| malformed(&id.to_string(), "assignment lhs has no vector width"))?;
        let full_mask = (1u8 << lhs_width) - 1;
        if a.write_mask & !full_mask != 0 {
            return Err(malformed(&id.to_string(), "write_mask has bits beyond lhs width"));
        }
        let written_lanes = a.write_mask.count_ones();
        if a.write_mask != full_mask {
            let rhs_width = self.reg.get(rhs_ty)?.vector_width().unwrap_or(1) as u32;
            if written_lanes != rhs_width {
                return Err(malformed(
                    &id.to_string(),
                    "popcount(write_mask) does not match rhs width",
                ));
            }
        }
        Ok(())
    }

    fn validate_call(&mut self, id: InstrId, c: &CallInstr) -> Result<()> {
        let callee = self.arena.get(c.callee);
        let Instr::Function(func) = callee else {
            return Err(malformed(&id.to_string(), "Call callee is not a Function"));
        };
        let Some(&sig_id) = func.signatures.first() else {
            return Err(malformed(&id.to_string(), "Call callee has no signatures"));
        };
        let Instr::FunctionSignature(sig) = self.arena.get(sig_id) else {
            return Err(malformed(&id.to_string(), "Function signature entry is malformed"));
        };
        if sig.params.len() != c.args.len() {
            return Err(malformed(&id.to_string(), "Call argument count does not match signature"));
        }
        for (&param_id, &arg_id) in sig.params.iter().zip(c.args.iter()) {
            let Instr::Variable(param) = self.arena.get(param_id) else {
                return Err(malformed(&id.to_string(), "signature parameter is not a Variable"));
            };
            let arg_ty = self.validate_rvalue(arg_id)?;
            if arg_ty != param.ty {
                return Err(malformed(&id.to_string(), "Call argument type does not match parameter"));
            }
        }
        Ok(())
    }

    fn validate_rvalue(&mut self, id: InstrId) -> Result<crate::type_id::TypeId> {
        let instr = self.arena.get(id);
        let ty = match instr {
            Instr::Variable(v) => v.ty,
            Instr::DerefVariable(d) => {
                if !matches!(self.arena.get(d.var), Instr::Variable(_)) {
                    return Err(malformed(&id.to_string(), "DerefVariable does not resolve to a Variable"));
                }
                d.result_type
            }
            Instr::DerefArray(d) => {
                let arr_ty = self.validate_rvalue(d.array)?;
                if !self.reg.is_array(arr_ty)? {
                    return Err(malformed(&id.to_string(), "DerefArray base is not an array type"));
                }
                self.validate_rvalue(d.index)?;
                d.result_type
            }
            Instr::DerefRecord(d) => {
                let rec_ty = self.validate_rvalue(d.record)?;
                let crate::types::GlslType::Struct(def) = self.reg.get(rec_ty)? else {
                    return Err(malformed(&id.to_string(), "DerefRecord base is not a struct type"));
                };
                if !def.fields.contains_key(&d.field) {
                    return Err(malformed(&id.to_string(), "DerefRecord field not found in struct"));
                }
                d.result_type
            }
            Instr::Expression(e) => {
                let operand_types: Vec<_> = e
                    .operands
                    .iter()
                    .map(|&o| self.validate_rvalue(o))
                    .collect::<Result<_>>()?;
                let expected = match (e.op, operand_types.as_slice()) {
                    (crate::ir::ExprOp::Unary(op), [t]) => unary_result_type(op, *t, self.reg)?,
                    (crate::ir::ExprOp::Binary(op), [l, r]) => binary_result_type(op, *l, *r, self.reg)?,
                    _ => {
                        return Err(malformed(&id.to_string(), "Expression operand count does not match opcode arity"));
                    }
                };
                if expected != e.result_type {
                    return Err(malformed(&id.to_string(), "Expression result type disagrees with opcode rule"));
                }
                e.result_type
            }
            Instr::Swizzle(s) => {
                let source_ty = self.validate_rvalue(s.source)?;
                let source_width = self.reg.get(source_ty)?.vector_width().ok_or_else(|| {
                    malformed(&id.to_string(), "Swizzle source is not a scalar/vector type")
                })?;
                if s.mask.components[..s.mask.num_components as usize]
                    .iter()
                    .any(|&c| c >= source_width)
                {
                    return Err(malformed(&id.to_string(), "Swizzle mask references lane beyond source width"));
                }
                let result_width = self.reg.get(s.result_type)?.vector_width().ok_or_else(|| {
                    malformed(&id.to_string(), "Swizzle result type is not a scalar/vector type")
                })?;
                if result_width != s.mask.num_components {
                    return Err(malformed(&id.to_string(), "Swizzle result width does not match mask"));
                }
                s.result_type
            }
            Instr::Constant(c) => {
                if !c.elements.is_empty() {
                    for &el in &c.elements {
                        self.validate_rvalue(el)?;
                    }
                } else {
                    let expected = self.reg.components(c.ty)?;
                    if expected != c.lanes.len() as u32 {
                        return Err(malformed(&id.to_string(), "Constant lane count does not match type"));
                    }
                }
                c.ty
            }
            Instr::Texture(t) => {
                self.validate_rvalue(t.sampler)?;
                self.validate_rvalue(t.coordinate)?;
                if let Some(p) = t.projector {
                    self.validate_rvalue(p)?;
                }
                if let Some(s) = t.shadow_comparator {
                    self.validate_rvalue(s)?;
                }
                match t.lod {
                    LodInfo::None => {}
                    LodInfo::Bias(b) | LodInfo::Lod(b) => {
                        self.validate_rvalue(b)?;
                    }
                    LodInfo::Grad { d_pdx, d_pdy } => {
                        self.validate_rvalue(d_pdx)?;
                        self.validate_rvalue(d_pdy)?;
                    }
                }
                t.result_type
            }
            Instr::Call(c) => {
                self.validate_call(id, c)?;
                let Instr::Function(func) = self.arena.get(c.callee) else {
                    unreachable!("validate_call already checked this");
                };
                let sig_id = func.signatures[0];
                let Instr::FunctionSignature(sig) = self.arena.get(sig_id) else {
                    unreachable!("validate_call already checked this");
                };
                sig.return_type
            }
            other => {
                return Err(malformed(
                    &id.to_string(),
                    format!("{} cannot appear as an rvalue", other.kind_name()),
                ));
            }
        };
        Ok(ty)
    }
}

pub fn validate(list: &InstrList, arena: &Arena, reg: &mut TypeRegistry) -> Result<()> {
    Validator::new(arena, reg).validate_list(list)
}
