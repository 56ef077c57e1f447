use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};
use crate::types::{BaseKind, GlslType, SamplerKind, StructDef};

/// Interned reference to a [`GlslType`] held by a [`TypeRegistry`].
///
/// Two `TypeId`s compare equal iff the types they name are structurally
/// identical -- identity of the id stands in for structural equality of the
/// underlying type, the same trick the teacher's `type_id.rs` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const UINT: TypeId = TypeId(3);
    pub const FLOAT: TypeId = TypeId(4);
}

const BUILTIN_COUNT: usize = 5;

/// Canonical store of every [`GlslType`] used in one compilation.
///
/// Pre-registers `void` and the four scalar base kinds; every vector,
/// matrix, array, struct and sampler shape is registered (and deduplicated)
/// on first request via `get_instance`/`register_*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: Vec<GlslType>,
    #[serde(skip)]
    vector_cache: HashMap<(BaseKind, u8), TypeId>,
    #[serde(skip)]
    matrix_cache: HashMap<(u8, u8), TypeId>,
    #[serde(skip)]
    array_cache: HashMap<(TypeId, u32), TypeId>,
    #[serde(skip)]
    struct_cache: HashMap<String, TypeId>,
    #[serde(skip)]
    sampler_cache: HashMap<SamplerKind, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let types = vec![
            GlslType::Void,
            GlslType::Scalar(BaseKind::Bool),
            GlslType::Scalar(BaseKind::Int),
            GlslType::Scalar(BaseKind::Uint),
            GlslType::Scalar(BaseKind::Float),
        ];
        debug_assert_eq!(types.len(), BUILTIN_COUNT);
        TypeRegistry {
            types,
            vector_cache: HashMap::new(),
            matrix_cache: HashMap::new(),
            array_cache: HashMap::new(),
            struct_cache: HashMap::new(),
            sampler_cache: HashMap::new(),
        }
    }

    pub fn get(&self, id: TypeId) -> Result<&GlslType> {
        self.types
            .get(id.0 as usize)
            .ok_or(CompileError::TypeNotFound { id })
    }

    pub fn scalar_type_id(&self, base: BaseKind) -> TypeId {
        match base {
            BaseKind::Bool => TypeId::BOOL,
            BaseKind::Int => TypeId::INT,
            BaseKind::Uint => TypeId::UINT,
            BaseKind::Float => TypeId::FLOAT,
        }
    }

    fn push(&mut self, ty: GlslType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Returns the canonical `TypeId` for a vector of `base` with `width`
    /// components, or the scalar id itself when `width == 1`.
    pub fn get_instance(&mut self, base: BaseKind, width: u8) -> TypeId {
        if width <= 1 {
            return self.scalar_type_id(base);
        }
        if let Some(&id) = self.vector_cache.get(&(base, width)) {
            return id;
        }
        let id = self.push(GlslType::Vector(base, width));
        self.vector_cache.insert((base, width), id);
        id
    }

    pub fn get_matrix(&mut self, cols: u8, rows: u8) -> TypeId {
        if let Some(&id) = self.matrix_cache.get(&(cols, rows)) {
            return id;
        }
        let id = self.push(GlslType::Matrix(cols, rows));
        self.matrix_cache.insert((cols, rows), id);
        id
    }

    pub fn get_array(&mut self, element: TypeId, len: u32) -> TypeId {
        if let Some(&id) = self.array_cache.get(&(element, len)) {
            return id;
        }
        let id = self.push(GlslType::Array { element, len });
        self.array_cache.insert((element, len), id);
        id
    }

    pub fn get_sampler(&mut self, kind: SamplerKind) -> TypeId {
        if let Some(&id) = self.sampler_cache.get(&kind) {
            return id;
        }
        let id = self.push(GlslType::Sampler(kind));
        self.sampler_cache.insert(kind, id);
        id
    }

    pub fn register_struct(&mut self, def: StructDef) -> Result<TypeId> {
        if self.struct_cache.contains_key(&def.name) {
            return Err(CompileError::DuplicateTypeName { name: def.name });
        }
        let name = def.name.clone();
        let id = self.push(GlslType::Struct(def));
        self.struct_cache.insert(name, id);
        Ok(id)
    }

    pub fn get_struct_by_name(&self, name: &str) -> Option<TypeId> {
        self.struct_cache.get(name).copied()
    }

    /// Number of scalar lanes carried by `id` (1 for scalars, 2..4 for
    /// vectors, cols*rows for matrices, element-components*len for fixed
    /// arrays).
    pub fn components(&self, id: TypeId) -> Result<u32> {
        Ok(match self.get(id)? {
            GlslType::Void => 0,
            GlslType::Scalar(_) => 1,
            GlslType::Vector(_, w) => *w as u32,
            GlslType::Matrix(c, r) => *c as u32 * *r as u32,
            GlslType::Array { element, len } => self.components(*element)? * (*len).max(1),
            GlslType::Struct(def) => {
                let mut total = 0;
                for field_ty in def.fields.values() {
                    total += self.components(*field_ty)?;
                }
                total
            }
            GlslType::Sampler(_) => 1,
        })
    }

    pub fn base_kind(&self, id: TypeId) -> Result<Option<BaseKind>> {
        Ok(match self.get(id)? {
            GlslType::Scalar(b) | GlslType::Vector(b, _) => Some(*b),
            GlslType::Matrix(..) => Some(BaseKind::Float),
            _ => None,
        })
    }

    pub fn is_array(&self, id: TypeId) -> Result<bool> {
        Ok(matches!(self.get(id)?, GlslType::Array { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_preregistered() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.get(TypeId::BOOL).unwrap(), &GlslType::Scalar(BaseKind::Bool));
        assert_eq!(reg.get(TypeId::FLOAT).unwrap(), &GlslType::Scalar(BaseKind::Float));
    }

    #[test]
    fn vector_instances_are_deduplicated() {
        let mut reg = TypeRegistry::new();
        let a = reg.get_instance(BaseKind::Float, 3);
        let b = reg.get_instance(BaseKind::Float, 3);
        assert_eq!(a, b);
        let c = reg.get_instance(BaseKind::Float, 4);
        assert_ne!(a, c);
    }

    #[test]
    fn scalar_width_one_returns_scalar_id() {
        let mut reg = TypeRegistry::new();
        assert_eq!(reg.get_instance(BaseKind::Int, 1), TypeId::INT);
    }

    #[test]
    fn duplicate_struct_name_errors() {
        let mut reg = TypeRegistry::new();
        let def = StructDef {
            name: "Light".to_string(),
            fields: Default::default(),
        };
        reg.register_struct(def.clone()).unwrap();
        assert!(matches!(
            reg.register_struct(def),
            Err(CompileError::DuplicateTypeName { .. })
        ));
    }

    #[test]
    fn array_components_multiply_element_by_len() {
        let mut reg = TypeRegistry::new();
        let vec3 = reg.get_instance(BaseKind::Float, 3);
        let arr = reg.get_array(vec3, 4);
        assert_eq!(reg.components(arr).unwrap(), 12);
    }

    #[test]
    fn serde_roundtrip_preserves_registered_types() {
        let mut reg = TypeRegistry::new();
        reg.get_instance(BaseKind::Float, 4);
        let json = serde_json::to_string(&reg).unwrap();
        let restored: TypeRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.types, reg.types);
    }
}
