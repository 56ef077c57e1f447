use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::type_id::TypeId;

/// Scalar base kind underlying every numeric/boolean type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseKind {
    Bool,
    Int,
    Uint,
    Float,
}

impl BaseKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, BaseKind::Bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplerKind {
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler2DShadow,
}

/// A named aggregate type with an ordered field list.
///
/// Field order is preserved (via [`IndexMap`]) because it is observable in
/// constructor argument order and in the printer's struct declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: IndexMap<String, TypeId>,
}

/// A canonical shader type descriptor.
///
/// Instances are produced and deduplicated exclusively through
/// [`crate::type_id::TypeRegistry`]; this enum itself carries no identity,
/// only shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlslType {
    Void,
    Scalar(BaseKind),
    Vector(BaseKind, u8),
    /// Column-major `cols x rows` matrix; always float-based in this
    /// language era.
    Matrix(u8, u8),
    Array { element: TypeId, len: u32 },
    Struct(StructDef),
    Sampler(SamplerKind),
}

impl GlslType {
    pub fn is_scalar(&self) -> bool {
        matches!(self, GlslType::Scalar(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, GlslType::Vector(..))
    }

    pub fn vector_width(&self) -> Option<u8> {
        match self {
            GlslType::Vector(_, w) => Some(*w),
            GlslType::Scalar(_) => Some(1),
            _ => None,
        }
    }
}

/// A compile-time constant value, one scalar slot per lane of its type.
///
/// Floats are stored as `f64` internally (never compared with `==`
/// directly in pass logic) so the enum itself can derive `PartialEq`
/// without running into `NaN` semantics, mirroring the teacher's
/// `ConstValue::F32(f64)` trick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstLane {
    Bool(bool),
    Int(i32),
    Uint(u32),
    Float(f64),
}

impl ConstLane {
    pub fn base_kind(&self) -> BaseKind {
        match self {
            ConstLane::Bool(_) => BaseKind::Bool,
            ConstLane::Int(_) => BaseKind::Int,
            ConstLane::Uint(_) => BaseKind::Uint,
            ConstLane::Float(_) => BaseKind::Float,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstLane::Float(f) => Some(*f),
            ConstLane::Int(i) => Some(*i as f64),
            ConstLane::Uint(u) => Some(*u as f64),
            ConstLane::Bool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_field_order_is_preserved() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), TypeId::FLOAT);
        fields.insert("b".to_string(), TypeId::INT);
        let def = StructDef { name: "S".into(), fields };
        let keys: Vec<_> = def.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn const_lane_serde_roundtrip() {
        let lane = ConstLane::Float(5.0);
        let json = serde_json::to_string(&lane).unwrap();
        let back: ConstLane = serde_json::from_str(&json).unwrap();
        assert_eq!(lane, back);
    }
}
