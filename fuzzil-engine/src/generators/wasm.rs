//! Generators valid only once a wasm module/function body is open: the
//! wasm-in-module registry, plus wasm type groups and forward references.
//! These never appear in the primary registry — the only door into this set
//! is [`crate::generators::functions::wasm_module_generator`] switching
//! `GenContext` onto [`crate::registry::RegistryKind::WasmModule`].
//!
//! `fuzzil-ir`'s opcode set has no dedicated wasm-numeric-constant opcode;
//! [`wasm_numeric_const_generator`] reuses `LoadInt`/`LoadFloat` and
//! overrides the inferred type with `set_type`, rather than widening the
//! frozen opcode enum for one generator's convenience.

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use fuzzil_ir::{Context, Opcode, Parameters, Type, Variable};
use rand::Rng;

fn recurse_body(ctx: &mut GenContext, of_n: u32) {
    let remaining = ctx.current_remaining().max(0) as u32;
    ctx.build_recursive(0, of_n, remaining);
}

fn any_wasm_numeric() -> Type {
    crate::generators::type_fns::any_wasm_numeric()
}

pub fn wasm_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let argc = ctx.builder.rng().random_range(0..=3);
    let open = ctx.builder.emit(Opcode::BeginWasmFunction, vec![], Parameters::ArgumentCount(argc));
    const PARAM_KINDS: &[fn() -> Type] = &[Type::wasm_i32, Type::wasm_i64, Type::wasm_f32, Type::wasm_f64];
    for &v in &open.inner_outputs {
        let kind = PARAM_KINDS[ctx.builder.rng().random_range(0..PARAM_KINDS.len())]();
        ctx.builder.set_type(v, kind);
    }
    ctx.build_prefix();
    recurse_body(ctx, 4);
    ctx.builder.emit(Opcode::EndWasmFunction, vec![], Parameters::None);
}

pub fn wasm_block_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginWasmBlock, vec![], Parameters::None);
    recurse_body(ctx, 2);
    ctx.builder.emit(Opcode::EndWasmBlock, vec![], Parameters::None);
}

pub fn wasm_loop_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginWasmLoop, vec![], Parameters::None);
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndWasmLoop, vec![], Parameters::None);
}

pub fn wasm_try_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginWasmTry, vec![], Parameters::None);
    recurse_body(ctx, 2);
    ctx.builder.emit(Opcode::EndWasmTry, vec![], Parameters::None);
}

/// Defines a type group of 1-3 array/struct/forward-reference members, then
/// resolves every forward reference it opened. Hand-coded as a direct
/// emission loop rather than routed through generic dispatch: this block
/// defines types, it doesn't execute code, so the ordinary
/// applicable-generator filtering by context bits doesn't model it well.
pub fn wasm_type_group_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginWasmTypeGroup, vec![], Parameters::None);
    let member_count = ctx.builder.rng().random_range(1..=3);
    let mut forward_refs = Vec::new();
    for _ in 0..member_count {
        match ctx.builder.rng().random_range(0..3) {
            0 => {
                ctx.builder.emit(Opcode::WasmDefineArrayType, vec![], Parameters::WasmTypeGroupMember { field_count: 1 });
            }
            1 => {
                let field_count = ctx.builder.rng().random_range(1..=4);
                ctx.builder.emit(Opcode::WasmDefineStructType, vec![], Parameters::WasmTypeGroupMember { field_count });
            }
            _ => {
                let nullable = ctx.builder.rng().random_bool(0.5);
                let inst = ctx
                    .builder
                    .emit(Opcode::WasmDefineForwardReference, vec![], Parameters::WasmForwardReferenceSlot { nullable });
                forward_refs.push(inst.outputs[0]);
            }
        }
    }
    for slot in forward_refs {
        ctx.builder.emit(Opcode::WasmResolveForwardReference, vec![slot], Parameters::None);
    }
    ctx.builder.emit(Opcode::EndWasmTypeGroup, vec![], Parameters::None);
}

/// Reuses `LoadInt`/`LoadFloat` and retypes the result to a wasm atom: wasm
/// numeric kinds are primitive atoms in the same lattice as JS primitives,
/// so this is a legitimate value generator rather than a workaround.
pub fn wasm_numeric_const_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    match ctx.builder.rng().random_range(0..4) {
        0 => {
            let v = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(ctx.builder.rng().random_range(-1000..1000))).outputs[0];
            ctx.builder.set_type(v, Type::wasm_i32());
        }
        1 => {
            let v = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(ctx.builder.rng().random_range(-1000..1000))).outputs[0];
            ctx.builder.set_type(v, Type::wasm_i64());
        }
        2 => {
            let v = ctx.builder.emit(Opcode::LoadFloat, vec![], Parameters::Float(ctx.builder.rng().random_range(-100.0..100.0))).outputs[0];
            ctx.builder.set_type(v, Type::wasm_f32());
        }
        _ => {
            let v = ctx.builder.emit(Opcode::LoadFloat, vec![], Parameters::Float(ctx.builder.rng().random_range(-100.0..100.0))).outputs[0];
            ctx.builder.set_type(v, Type::wasm_f64());
        }
    }
}

pub const ENTRIES: &[(GeneratorDescriptor, u32)] = &[
    (
        GeneratorDescriptor {
            name: "WasmFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::WASM,
            produces: None,
            body: wasm_function_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "WasmBlockGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::WASM,
            produces: None,
            body: wasm_block_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "WasmLoopGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::WASM,
            produces: None,
            body: wasm_loop_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "WasmTryGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::WASM,
            produces: None,
            body: wasm_try_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "WasmTypeGroupGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::WASM,
            produces: None,
            body: wasm_type_group_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "WasmNumericConstGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::WASM,
            produces: Some(&[any_wasm_numeric]),
            body: wasm_numeric_const_generator,
        },
        6,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::registry::Registries;
    use fuzzil_builder::ProgramBuilder;

    #[test]
    fn wasm_numeric_const_is_typed_as_wasm_atom() {
        let mut builder = ProgramBuilder::new(21);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        wasm_numeric_const_generator(&mut ctx, &[]);
        let produced = ctx.builder.code().iter().last().unwrap().outputs[0];
        assert!(ctx.builder.type_of(produced).is(&any_wasm_numeric()));
    }

    #[test]
    fn wasm_type_group_resolves_every_forward_reference_it_opens() {
        let mut builder = ProgramBuilder::new(22);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
        wasm_type_group_generator(&mut ctx, &[]);
        ctx.builder.emit(Opcode::EndWasmModule, vec![], Parameters::None);
        assert!(ctx.builder.code().check().is_ok());
    }
}
