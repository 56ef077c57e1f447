use crate::error::{CompileError, Result};
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::BaseKind;

/// Closed enumeration of unary expression opcodes.
///
/// Order matches the original printer's `operator_glsl_strs` table exactly,
/// so `glsl_name`/`is_conversion` can be simple match arms rather than a
/// lookup table that could drift out of sync with the opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    BitNot,
    LogicNot,
    Neg,
    Abs,
    Sign,
    Rcp,
    Rsq,
    Sqrt,
    Exp,
    Log,
    Exp2,
    Log2,
    /// float -> int
    F2I,
    /// int -> float
    I2F,
    /// float -> bool
    F2B,
    /// bool -> float
    B2F,
    /// bool -> int
    B2I,
    /// int -> bool
    I2B,
    /// uint -> float
    U2F,
    Trunc,
    Ceil,
    Floor,
    Fract,
    Sin,
    Cos,
    DFdx,
    DFdy,
}

impl UnaryOp {
    /// `true` for the type-conversion opcodes, which the printer renders as
    /// `T(x)` (a constructor call naming the *result* type) rather than
    /// `opname(x)`.
    pub fn is_conversion(self) -> bool {
        matches!(
            self,
            UnaryOp::F2I
                | UnaryOp::I2F
                | UnaryOp::F2B
                | UnaryOp::B2F
                | UnaryOp::B2I
                | UnaryOp::I2B
                | UnaryOp::U2F
        )
    }

    /// The function-style name used when printing a non-conversion unary
    /// expression, e.g. `abs(x)`. Verbatim from the original printer's
    /// `operator_glsl_strs` table.
    pub fn glsl_name(self) -> &'static str {
        match self {
            UnaryOp::BitNot => "~",
            UnaryOp::LogicNot => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Abs => "abs",
            UnaryOp::Sign => "sign",
            UnaryOp::Rcp => "1.0/",
            UnaryOp::Rsq => "inversesqrt",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Exp2 => "exp2",
            UnaryOp::Log2 => "log2",
            UnaryOp::F2I => "int",
            UnaryOp::I2F => "float",
            UnaryOp::F2B => "bool",
            UnaryOp::B2F => "float",
            UnaryOp::B2I => "int",
            UnaryOp::I2B => "bool",
            UnaryOp::U2F => "float",
            UnaryOp::Trunc => "trunc",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Floor => "floor",
            UnaryOp::Fract => "fract",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::DFdx => "dFdx",
            UnaryOp::DFdy => "dFdy",
        }
    }

    /// Result base kind for a unary op applied to an operand of base kind
    /// `operand`. Width is preserved by the caller (unary ops never change
    /// vector width).
    pub fn result_base_kind(self, operand: BaseKind) -> Result<BaseKind> {
        Ok(match self {
            UnaryOp::LogicNot => BaseKind::Bool,
            UnaryOp::F2I => BaseKind::Int,
            UnaryOp::I2F | UnaryOp::B2F | UnaryOp::U2F => BaseKind::Float,
            UnaryOp::F2B | UnaryOp::I2B => BaseKind::Bool,
            UnaryOp::B2I => BaseKind::Int,
            _ => operand,
        })
    }
}

/// Closed enumeration of binary expression opcodes, ordered to match the
/// original printer's operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicXor,
    LogicOr,
    Dot,
    Cross,
    Min,
    Max,
    Pow,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_infix_symbol(self) -> bool {
        !matches!(self, BinaryOp::Dot | BinaryOp::Cross | BinaryOp::Min | BinaryOp::Max | BinaryOp::Pow)
    }

    /// Operator spelling used by the printer: an infix symbol for the
    /// arithmetic/comparison/bit/logic family (`(a OP b)`), or a
    /// function-call name for `dot`/`cross`/`min`/`max`/`pow`
    /// (`name(a, b)`).
    pub fn glsl_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::LogicAnd => "&&",
            BinaryOp::LogicXor => "^^",
            BinaryOp::LogicOr => "||",
            BinaryOp::Dot => "dot",
            BinaryOp::Cross => "cross",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Pow => "pow",
        }
    }
}

/// Resolves the result type of a unary expression.
///
/// Grounded on the teacher's `resolve_type_rule`/`resolve_core_rule`
/// exhaustive-match discipline: every opcode is handled explicitly, no
/// wildcard arm, so a newly added opcode fails to compile until its rule
/// is written.
pub fn unary_result_type(op: UnaryOp, operand: TypeId, reg: &mut TypeRegistry) -> Result<TypeId> {
    let base = reg
        .base_kind(operand)?
        .ok_or_else(|| CompileError::Unsupported(format!("unary op {:?} on non-numeric type", op)))?;
    let width = reg
        .get(operand)?
        .vector_width()
        .ok_or_else(|| CompileError::Unsupported(format!("unary op {:?} on non-scalar/vector type", op)))?;
    let result_base = op.result_base_kind(base)?;
    Ok(reg.get_instance(result_base, width))
}

/// Resolves the result type of a binary expression.
///
/// Arithmetic ops broadcast scalar-against-vector; comparisons yield bool
/// (matching the lhs's vector width, i.e. `bvec` when comparing vectors);
/// shifts preserve the left operand's type; `dot` always yields a scalar
/// float; `cross` requires and returns `vec3`; `min`/`max`/`pow` behave
/// like elementwise arithmetic.
pub fn binary_result_type(
    op: BinaryOp,
    lhs: TypeId,
    rhs: TypeId,
    reg: &mut TypeRegistry,
) -> Result<TypeId> {
    match op {
        BinaryOp::Shl | BinaryOp::Shr => Ok(lhs),
        BinaryOp::Dot => Ok(TypeId::FLOAT),
        BinaryOp::Cross => Ok(reg.get_instance(BaseKind::Float, 3)),
        _ => {
            let lhs_width = reg
                .get(lhs)?
                .vector_width()
                .ok_or_else(|| CompileError::Unsupported(format!("binary op {:?} on non-scalar/vector lhs", op)))?;
            let rhs_width = reg
                .get(rhs)?
                .vector_width()
                .ok_or_else(|| CompileError::Unsupported(format!("binary op {:?} on non-scalar/vector rhs", op)))?;
            let width = lhs_width.max(rhs_width);
            let base = reg
                .base_kind(lhs)?
                .ok_or_else(|| CompileError::Unsupported(format!("binary op {:?} on non-numeric lhs", op)))?;
            if op.is_comparison() {
                Ok(reg.get_instance(BaseKind::Bool, width))
            } else {
                Ok(reg.get_instance(base, width))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_ops_are_flagged() {
        assert!(UnaryOp::F2I.is_conversion());
        assert!(!UnaryOp::Abs.is_conversion());
    }

    #[test]
    fn comparison_yields_bool_same_width() {
        let mut reg = TypeRegistry::new();
        let v3 = reg.get_instance(BaseKind::Float, 3);
        let result = binary_result_type(BinaryOp::Lt, v3, v3, &mut reg).unwrap();
        assert_eq!(reg.get(result).unwrap().vector_width(), Some(3));
        assert_eq!(reg.base_kind(result).unwrap(), Some(BaseKind::Bool));
    }

    #[test]
    fn dot_always_returns_scalar_float() {
        let mut reg = TypeRegistry::new();
        let v4 = reg.get_instance(BaseKind::Float, 4);
        let result = binary_result_type(BinaryOp::Dot, v4, v4, &mut reg).unwrap();
        assert_eq!(result, TypeId::FLOAT);
    }

    #[test]
    fn shift_preserves_lhs_type() {
        let mut reg = TypeRegistry::new();
        let iv = reg.get_instance(BaseKind::Int, 2);
        let result = binary_result_type(BinaryOp::Shl, iv, TypeId::INT, &mut reg).unwrap();
        assert_eq!(result, iv);
    }

    #[test]
    fn f2i_result_base_kind_is_int() {
        assert_eq!(UnaryOp::F2I.result_base_kind(BaseKind::Float).unwrap(), BaseKind::Int);
    }
}
