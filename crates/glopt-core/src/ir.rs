//! The sixteen HIR instruction kinds and their essential fields.
//!
//! Every node lives in an [`crate::arena::Arena`] and is addressed by
//! [`InstrId`]; top-level (statement) instructions additionally belong to
//! exactly one [`crate::list::InstrList`]. Expression/rvalue subtrees are
//! reached only through the `InstrId` fields of their parent and are not
//! independently listed -- list membership (validator invariant 2) is a
//! property of statement-level instructions, not of every arena entry.

use smallvec::SmallVec;

use crate::arena::InstrId;
use crate::list::InstrList;
use crate::ops::{BinaryOp, UnaryOp};
use crate::type_id::TypeId;
use crate::types::ConstLane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageQualifier {
    Auto,
    Uniform,
    In,
    Out,
    Inout,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Smooth,
    Flat,
    NoPerspective,
}

#[derive(Debug, Clone)]
pub struct VariableInstr {
    pub name: String,
    pub ty: TypeId,
    pub storage: StorageQualifier,
    pub interpolation: Interpolation,
    pub centroid: bool,
    pub invariant: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionSignatureInstr {
    pub return_type: TypeId,
    /// Each entry is the `InstrId` of a `Variable` instruction.
    pub params: Vec<InstrId>,
    pub body: InstrList,
    pub is_defined: bool,
    pub is_built_in: bool,
    pub parent: Option<InstrId>,
}

#[derive(Debug, Clone)]
pub struct FunctionInstr {
    pub name: String,
    /// Each entry is the `InstrId` of a `FunctionSignature` instruction
    /// (overloads of the same name).
    pub signatures: Vec<InstrId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOp {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

#[derive(Debug, Clone)]
pub struct ExpressionInstr {
    pub op: ExprOp,
    pub result_type: TypeId,
    pub operands: SmallVec<[InstrId; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOp {
    Tex,
    Txb,
    Txl,
    Txf,
    Txd,
}

#[derive(Debug, Clone, Copy)]
pub enum LodInfo {
    None,
    Bias(InstrId),
    Lod(InstrId),
    Grad { d_pdx: InstrId, d_pdy: InstrId },
}

#[derive(Debug, Clone)]
pub struct TextureInstr {
    pub op: TextureOp,
    pub sampler: InstrId,
    pub coordinate: InstrId,
    pub offset: [i32; 3],
    pub projector: Option<InstrId>,
    pub shadow_comparator: Option<InstrId>,
    pub lod: LodInfo,
    pub result_type: TypeId,
}

/// A selection/permutation mask over up to 4 source lanes.
///
/// `components[i]` names the source lane (0=x..3=w) feeding destination
/// lane `i`, for `i < num_components`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwizzleMask {
    pub components: [u8; 4],
    pub num_components: u8,
}

impl SwizzleMask {
    pub fn is_identity(&self, source_width: u8) -> bool {
        self.num_components == source_width
            && (0..self.num_components).all(|i| self.components[i as usize] == i)
    }

    pub fn letters(&self) -> String {
        const LANE: [char; 4] = ['x', 'y', 'z', 'w'];
        (0..self.num_components)
            .map(|i| LANE[self.components[i as usize] as usize])
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SwizzleInstr {
    pub source: InstrId,
    pub mask: SwizzleMask,
    pub result_type: TypeId,
}

#[derive(Debug, Clone)]
pub struct DerefVariableInstr {
    pub var: InstrId,
    pub result_type: TypeId,
}

#[derive(Debug, Clone)]
pub struct DerefArrayInstr {
    pub array: InstrId,
    pub index: InstrId,
    pub result_type: TypeId,
}

#[derive(Debug, Clone)]
pub struct DerefRecordInstr {
    pub record: InstrId,
    pub field: String,
    pub result_type: TypeId,
}

#[derive(Debug, Clone)]
pub struct AssignmentInstr {
    pub lhs: InstrId,
    pub rhs: InstrId,
    /// Bit `i` set iff lane `i` of `lhs` is written. `0b1111` (or the full
    /// mask for narrower types) means "every lane".
    pub write_mask: u8,
    pub condition: Option<InstrId>,
}

#[derive(Debug, Clone)]
pub struct ConstantInstr {
    pub ty: TypeId,
    /// Populated for scalar/vector constants; one entry per lane.
    pub lanes: SmallVec<[ConstLane; 4]>,
    /// Populated for array/struct constants; each entry is the `InstrId`
    /// of a nested `Constant` instruction.
    pub elements: Vec<InstrId>,
}

#[derive(Debug, Clone)]
pub struct CallInstr {
    /// `InstrId` of the resolved `Function`.
    pub callee: InstrId,
    pub args: Vec<InstrId>,
}

#[derive(Debug, Clone)]
pub struct ReturnInstr {
    pub value: Option<InstrId>,
}

#[derive(Debug, Clone)]
pub struct DiscardInstr {
    pub condition: Option<InstrId>,
}

#[derive(Debug, Clone)]
pub struct IfInstr {
    pub condition: InstrId,
    pub then_list: InstrList,
    pub else_list: InstrList,
}

#[derive(Debug, Clone)]
pub struct LoopInstr {
    pub body: InstrList,
    pub counter: Option<InstrId>,
    pub from: Option<InstrId>,
    pub to: Option<InstrId>,
    pub increment: Option<InstrId>,
}

impl LoopInstr {
    /// `true` when none of the induction fields are present, i.e. this
    /// prints as `while (true) { ... }`.
    pub fn is_unbounded(&self) -> bool {
        self.counter.is_none() && self.from.is_none() && self.to.is_none() && self.increment.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopJumpKind {
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct LoopJumpInstr {
    pub kind: LoopJumpKind,
}

#[derive(Debug, Clone)]
pub enum Instr {
    Variable(VariableInstr),
    FunctionSignature(FunctionSignatureInstr),
    Function(FunctionInstr),
    Expression(ExpressionInstr),
    Texture(TextureInstr),
    Swizzle(SwizzleInstr),
    DerefVariable(DerefVariableInstr),
    DerefArray(DerefArrayInstr),
    DerefRecord(DerefRecordInstr),
    Assignment(AssignmentInstr),
    Constant(ConstantInstr),
    Call(CallInstr),
    Return(ReturnInstr),
    Discard(DiscardInstr),
    If(IfInstr),
    Loop(LoopInstr),
    LoopJump(LoopJumpInstr),
}

impl Instr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Instr::Variable(_) => "Variable",
            Instr::FunctionSignature(_) => "FunctionSignature",
            Instr::Function(_) => "Function",
            Instr::Expression(_) => "Expression",
            Instr::Texture(_) => "Texture",
            Instr::Swizzle(_) => "Swizzle",
            Instr::DerefVariable(_) => "DerefVariable",
            Instr::DerefArray(_) => "DerefArray",
            Instr::DerefRecord(_) => "DerefRecord",
            Instr::Assignment(_) => "Assignment",
            Instr::Constant(_) => "Constant",
            Instr::Call(_) => "Call",
            Instr::Return(_) => "Return",
            Instr::Discard(_) => "Discard",
            Instr::If(_) => "If",
            Instr::Loop(_) => "Loop",
            Instr::LoopJump(_) => "LoopJump",
        }
    }

    /// The node's own rvalue type, for kinds that have one (statement
    /// kinds like `If`/`Return`/`LoopJump` have none).
    pub fn result_type(&self) -> Option<TypeId> {
        match self {
            Instr::Variable(v) => Some(v.ty),
            Instr::Expression(e) => Some(e.result_type),
            Instr::Texture(t) => Some(t.result_type),
            Instr::Swizzle(s) => Some(s.result_type),
            Instr::DerefVariable(d) => Some(d.result_type),
            Instr::DerefArray(d) => Some(d.result_type),
            Instr::DerefRecord(d) => Some(d.result_type),
            Instr::Constant(c) => Some(c.ty),
            _ => None,
        }
    }
}
