//! Canned HIR for the `demo` subcommand.
//!
//! There is no lexer/parser in this crate (see `glopt_core::frontend`),
//! so the CLI cannot accept an arbitrary `.vert`/`.frag` file; instead
//! it builds a small hand-written shader directly against the arena,
//! the same way `DirectBuilder`-based tests do, and runs it through the
//! same `optimize_hir` pipeline a real front end would feed.

use smallvec::smallvec;

use glopt_core::frontend::ShaderStage;
use glopt_core::ir::*;
use glopt_core::ops::BinaryOp;
use glopt_core::types::{BaseKind, ConstLane};
use glopt_core::{Arena, InstrId, InstrList, TypeRegistry};

pub fn build(stage: ShaderStage, arena: &mut Arena, reg: &mut TypeRegistry) -> InstrList {
    match stage {
        ShaderStage::Vertex => build_vertex(arena, reg),
        ShaderStage::Fragment => build_fragment(arena, reg),
    }
}

fn declare(arena: &mut Arena, name: &str, ty: glopt_core::TypeId, storage: StorageQualifier) -> InstrId {
    arena.alloc(Instr::Variable(VariableInstr {
        name: name.to_string(),
        ty,
        storage,
        interpolation: Interpolation::Smooth,
        centroid: false,
        invariant: false,
    }))
}

fn read(arena: &mut Arena, var: InstrId, ty: glopt_core::TypeId) -> InstrId {
    arena.alloc(Instr::DerefVariable(DerefVariableInstr { var, result_type: ty }))
}

fn assign(arena: &mut Arena, lhs: InstrId, rhs: InstrId, write_mask: u8) -> InstrId {
    arena.alloc(Instr::Assignment(AssignmentInstr { lhs, rhs, write_mask, condition: None }))
}

fn binary(arena: &mut Arena, op: BinaryOp, lhs: InstrId, rhs: InstrId, ty: glopt_core::TypeId) -> InstrId {
    arena.alloc(Instr::Expression(ExpressionInstr {
        op: ExprOp::Binary(op),
        result_type: ty,
        operands: smallvec![lhs, rhs],
    }))
}

/// `vec3 scaleVec(vec3 v, float s) { return v * s; }`, as a single,
/// non-recursive, defined signature -- an inlining candidate.
fn declare_scale_vec(arena: &mut Arena, reg: &mut TypeRegistry, vec3: glopt_core::TypeId) -> InstrId {
    let v = declare(arena, "v", vec3, StorageQualifier::Auto);
    let s = declare(arena, "s", glopt_core::TypeId::FLOAT, StorageQualifier::Auto);
    let v_read = read(arena, v, vec3);
    let s_read = read(arena, s, glopt_core::TypeId::FLOAT);
    let mul = binary(arena, BinaryOp::Mul, v_read, s_read, vec3);
    let ret = arena.alloc(Instr::Return(ReturnInstr { value: Some(mul) }));
    let body: InstrList = [ret].into_iter().collect();
    let sig = arena.alloc(Instr::FunctionSignature(FunctionSignatureInstr {
        return_type: vec3,
        params: vec![v, s],
        body,
        is_defined: true,
        is_built_in: false,
        parent: None,
    }));
    let _ = reg; // reserved for a future overloaded-signature demo
    arena.alloc(Instr::Function(FunctionInstr { name: "scaleVec".to_string(), signatures: vec![sig] }))
}

/// A vertex shader whose `main` exercises function inlining, copy
/// propagation, dead code elimination, algebraic zero-folding, and
/// identity-swizzle removal across a few fixed-point sweeps.
fn build_vertex(arena: &mut Arena, reg: &mut TypeRegistry) -> InstrList {
    let vec3 = reg.get_instance(BaseKind::Float, 3);
    let float = glopt_core::TypeId::FLOAT;

    let scale = declare(arena, "scale", float, StorageQualifier::Uniform);
    let position = declare(arena, "position", vec3, StorageQualifier::In);
    let v_color = declare(arena, "v_color", vec3, StorageQualifier::Out);
    let scale_vec_fn = declare_scale_vec(arena, reg, vec3);

    let temp = declare(arena, "temp", vec3, StorageQualifier::Temporary);
    let call = arena.alloc(Instr::Call(CallInstr {
        callee: scale_vec_fn,
        args: vec![read(arena, position, vec3), read(arena, scale, float)],
    }));
    let assign_temp = assign(arena, read(arena, temp, vec3), call, 0b111);

    let copy = declare(arena, "copy", vec3, StorageQualifier::Temporary);
    let assign_copy = assign(arena, read(arena, copy, vec3), read(arena, temp, vec3), 0b111);

    let zero = arena.alloc(Instr::Constant(ConstantInstr {
        ty: vec3,
        lanes: smallvec![ConstLane::Float(0.0), ConstLane::Float(0.0), ConstLane::Float(0.0)],
        elements: Vec::new(),
    }));
    let adjusted = declare(arena, "adjusted", vec3, StorageQualifier::Temporary);
    let copy_plus_zero = binary(arena, BinaryOp::Add, read(arena, copy, vec3), zero, vec3);
    let assign_adjusted = assign(arena, read(arena, adjusted, vec3), copy_plus_zero, 0b111);

    let same = declare(arena, "same", vec3, StorageQualifier::Temporary);
    let identity_mask = SwizzleMask { components: [0, 1, 2, 0], num_components: 3 };
    let swizzled = arena.alloc(Instr::Swizzle(SwizzleInstr {
        source: read(arena, position, vec3),
        mask: identity_mask,
        result_type: vec3,
    }));
    let assign_same = assign(arena, read(arena, same, vec3), swizzled, 0b111);

    let sum = binary(arena, BinaryOp::Add, read(arena, adjusted, vec3), read(arena, same, vec3), vec3);
    let assign_color = assign(arena, read(arena, v_color, vec3), sum, 0b111);

    let main_body: InstrList = [
        temp,
        assign_temp,
        copy,
        assign_copy,
        adjusted,
        assign_adjusted,
        same,
        assign_same,
        assign_color,
    ]
    .into_iter()
    .collect();
    let main_sig = arena.alloc(Instr::FunctionSignature(FunctionSignatureInstr {
        return_type: glopt_core::TypeId::VOID,
        params: Vec::new(),
        body: main_body,
        is_defined: true,
        is_built_in: false,
        parent: None,
    }));
    let main_fn = arena.alloc(Instr::Function(FunctionInstr { name: "main".to_string(), signatures: vec![main_sig] }));

    [scale, position, v_color, scale_vec_fn, main_fn].into_iter().collect()
}

/// `addColor(a, b) { return a + b; }`, then `sum - sum` (algebraic
/// zero) feeding `zeroed + sum` (algebraic identity), which should
/// collapse all the way down to `fragColor = sum` once the driver
/// reaches its fixed point.
fn build_fragment(arena: &mut Arena, reg: &mut TypeRegistry) -> InstrList {
    let vec3 = reg.get_instance(BaseKind::Float, 3);

    let u_color = declare(arena, "uColor", vec3, StorageQualifier::Uniform);
    let v_color = declare(arena, "vColor", vec3, StorageQualifier::In);
    let frag_color = declare(arena, "fragColor", vec3, StorageQualifier::Out);

    let a = declare(arena, "a", vec3, StorageQualifier::Auto);
    let b = declare(arena, "b", vec3, StorageQualifier::Auto);
    let add = binary(arena, BinaryOp::Add, read(arena, a, vec3), read(arena, b, vec3), vec3);
    let ret = arena.alloc(Instr::Return(ReturnInstr { value: Some(add) }));
    let add_body: InstrList = [ret].into_iter().collect();
    let add_sig = arena.alloc(Instr::FunctionSignature(FunctionSignatureInstr {
        return_type: vec3,
        params: vec![a, b],
        body: add_body,
        is_defined: true,
        is_built_in: false,
        parent: None,
    }));
    let add_color_fn =
        arena.alloc(Instr::Function(FunctionInstr { name: "addColor".to_string(), signatures: vec![add_sig] }));

    let sum = declare(arena, "sum", vec3, StorageQualifier::Temporary);
    let call = arena.alloc(Instr::Call(CallInstr {
        callee: add_color_fn,
        args: vec![read(arena, v_color, vec3), read(arena, u_color, vec3)],
    }));
    let assign_sum = assign(arena, read(arena, sum, vec3), call, 0b111);

    let zeroed = declare(arena, "zeroed", vec3, StorageQualifier::Temporary);
    let sub = binary(arena, BinaryOp::Sub, read(arena, sum, vec3), read(arena, sum, vec3), vec3);
    let assign_zeroed = assign(arena, read(arena, zeroed, vec3), sub, 0b111);

    let added_back = binary(arena, BinaryOp::Add, read(arena, zeroed, vec3), read(arena, sum, vec3), vec3);
    let assign_frag = assign(arena, read(arena, frag_color, vec3), added_back, 0b111);

    let main_body: InstrList =
        [sum, assign_sum, zeroed, assign_zeroed, assign_frag].into_iter().collect();
    let main_sig = arena.alloc(Instr::FunctionSignature(FunctionSignatureInstr {
        return_type: glopt_core::TypeId::VOID,
        params: Vec::new(),
        body: main_body,
        is_defined: true,
        is_built_in: false,
        parent: None,
    }));
    let main_fn = arena.alloc(Instr::Function(FunctionInstr { name: "main".to_string(), signatures: vec![main_sig] }));

    [u_color, v_color, frag_color, add_color_fn, main_fn].into_iter().collect()
}
