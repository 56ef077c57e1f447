//! End-to-end coverage of `Context::optimize_hir` bypassing the front end,
//! the same way the CLI's `demo` subcommand and this crate's own doc
//! comment describe.

use glopt_core::frontend::ShaderStage;
use glopt_core::ir::*;
use glopt_core::types::{BaseKind, ConstLane};
use glopt_core::{Arena, InstrList, TypeRegistry};
use glopt_facade::Context;

#[test]
fn a_trivial_valid_shader_round_trips_through_validate_optimize_print() {
    let mut arena = Arena::new();
    let mut reg = TypeRegistry::new();
    let vec3_ty = reg.get_instance(BaseKind::Float, 3);

    let position = arena.alloc(Instr::Variable(VariableInstr {
        name: "position".to_string(),
        ty: vec3_ty,
        storage: StorageQualifier::In,
        interpolation: Interpolation::Smooth,
        centroid: false,
        invariant: false,
    }));
    let v_pos = arena.alloc(Instr::Variable(VariableInstr {
        name: "v_pos".to_string(),
        ty: vec3_ty,
        storage: StorageQualifier::Out,
        interpolation: Interpolation::Smooth,
        centroid: false,
        invariant: false,
    }));
    let position_deref =
        arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: position, result_type: vec3_ty }));
    let v_pos_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: v_pos, result_type: vec3_ty }));
    let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
        lhs: v_pos_deref,
        rhs: position_deref,
        write_mask: 0b0111,
        condition: None,
    }));
    let list: InstrList = [position, v_pos, assign].into_iter().collect();

    let mut ctx = Context::new();
    let shader = ctx.optimize_hir(ShaderStage::Vertex, arena, list);

    assert!(shader.status, "log: {}", shader.log);
    assert!(shader.raw_output.contains("v_pos = position;"));
    assert!(shader.optimized_output.contains("v_pos = position;"));
}

#[test]
fn a_malformed_write_mask_fails_validation_and_reports_in_the_log() {
    let mut arena = Arena::new();
    let mut reg = TypeRegistry::new();
    let vec4_ty = reg.get_instance(BaseKind::Float, 4);

    let out = arena.alloc(Instr::Variable(VariableInstr {
        name: "out_color".to_string(),
        ty: vec4_ty,
        storage: StorageQualifier::Out,
        interpolation: Interpolation::Smooth,
        centroid: false,
        invariant: false,
    }));
    let out_deref = arena.alloc(Instr::DerefVariable(DerefVariableInstr { var: out, result_type: vec4_ty }));
    let one = arena.alloc(Instr::Constant(ConstantInstr {
        ty: glopt_core::TypeId::FLOAT,
        lanes: smallvec::smallvec![ConstLane::Float(1.0)],
        elements: Vec::new(),
    }));
    // Two lanes claimed by the mask but the rhs is a bare scalar.
    let assign = arena.alloc(Instr::Assignment(AssignmentInstr {
        lhs: out_deref,
        rhs: one,
        write_mask: 0b0011,
        condition: None,
    }));
    let list: InstrList = [out, assign].into_iter().collect();

    let mut ctx = Context::new();
    let shader = ctx.optimize_hir(ShaderStage::Fragment, arena, list);

    assert!(!shader.status);
    assert!(!shader.log.is_empty());
    assert!(shader.optimized_output.is_empty());
}
