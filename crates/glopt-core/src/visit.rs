//! Tree-walk helpers shared by the validator, the printer, and passes.
//!
//! Replaces the original's visitor-over-a-class-hierarchy with a tagged
//! `match` over [`Instr`] plus two small capabilities: an `enter`/`leave`
//! read-only walk ([`Visitor`], [`walk_instr`]) and a direct-operand
//! enumerator ([`for_each_operand`]) that passes use to rewrite a single
//! child reference in place without having to special-case every
//! instruction kind themselves.

use crate::arena::{Arena, InstrId};
use crate::ir::Instr;
use crate::list::InstrList;

/// Read-only visitor over the HIR. Implement only the hooks you need;
/// defaults do nothing.
pub trait Visitor {
    fn enter(&mut self, _id: InstrId, _instr: &Instr, _arena: &Arena) {}
    fn leave(&mut self, _id: InstrId, _instr: &Instr, _arena: &Arena) {}
}

pub fn walk_list<V: Visitor>(list: &InstrList, arena: &Arena, visitor: &mut V) {
    for id in list.iter() {
        walk_instr(id, arena, visitor);
    }
}

pub fn walk_instr<V: Visitor>(id: InstrId, arena: &Arena, visitor: &mut V) {
    let instr = arena.get(id);
    visitor.enter(id, instr, arena);
    for_each_operand(instr, |child| walk_instr(child, arena, visitor));
    match instr {
        Instr::FunctionSignature(sig) => walk_list(&sig.body, arena, visitor),
        Instr::If(if_instr) => {
            walk_list(&if_instr.then_list, arena, visitor);
            walk_list(&if_instr.else_list, arena, visitor);
        }
        Instr::Loop(loop_instr) => walk_list(&loop_instr.body, arena, visitor),
        _ => {}
    }
    // Re-borrow: `instr` above is still valid since the arena was not
    // mutated during a read-only walk.
    visitor.leave(id, instr, arena);
}

/// Invokes `f` once per immediate rvalue/lvalue operand of `instr` (not
/// recursing, and not descending into nested statement lists -- callers
/// that need those call `walk_list` on the relevant body separately).
pub fn for_each_operand(instr: &Instr, mut f: impl FnMut(InstrId)) {
    match instr {
        Instr::Variable(_) | Instr::Function(_) | Instr::Constant(_) | Instr::LoopJump(_) => {}
        Instr::FunctionSignature(sig) => {
            for &p in &sig.params {
                f(p);
            }
        }
        Instr::Expression(e) => {
            for &o in &e.operands {
                f(o);
            }
        }
        Instr::Texture(t) => {
            f(t.sampler);
            f(t.coordinate);
            if let Some(p) = t.projector {
                f(p);
            }
            if let Some(s) = t.shadow_comparator {
                f(s);
            }
            match t.lod {
                crate::ir::LodInfo::None => {}
                crate::ir::LodInfo::Bias(b) => f(b),
                crate::ir::LodInfo::Lod(l) => f(l),
                crate::ir::LodInfo::Grad { d_pdx, d_pdy } => {
                    f(d_pdx);
                    f(d_pdy);
                }
            }
        }
        Instr::Swizzle(s) => f(s.source),
        Instr::DerefVariable(d) => f(d.var),
        Instr::DerefArray(d) => {
            f(d.array);
            f(d.index);
        }
        Instr::DerefRecord(d) => f(d.record),
        Instr::Assignment(a) => {
            f(a.lhs);
            f(a.rhs);
            if let Some(c) = a.condition {
                f(c);
            }
        }
        Instr::Call(c) => {
            for &a in &c.args {
                f(a);
            }
        }
        Instr::Return(r) => {
            if let Some(v) = r.value {
                f(v);
            }
        }
        Instr::Discard(d) => {
            if let Some(c) = d.condition {
                f(c);
            }
        }
        Instr::If(i) => f(i.condition),
        Instr::Loop(l) => {
            if let Some(c) = l.counter {
                f(c);
            }
            if let Some(c) = l.from {
                f(c);
            }
            if let Some(c) = l.to {
                f(c);
            }
            if let Some(c) = l.increment {
                f(c);
            }
        }
    }
}
