//! Function, class, and wasm-module-opening generators. The wasm-module
//! generator lives in the *primary* registry but hands its own body off to
//! the wasm-in-module registry via [`GenContext::with_wasm_module_registry`].

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use fuzzil_env::type_ext::random_type;
use fuzzil_ir::{Context, Opcode, Parameters, Type, Variable};
use rand::Rng;

fn recurse_body(ctx: &mut GenContext, of_n: u32) {
    let remaining = ctx.current_remaining().max(0) as u32;
    ctx.build_recursive(0, of_n, remaining);
}

fn open_function(ctx: &mut GenContext, open_opcode: Opcode, close_opcode: Opcode) {
    let argc = ctx.builder.rng().random_range(0..=3);
    let open = ctx.builder.emit(open_opcode, vec![], Parameters::ArgumentCount(argc));
    let param_types: Vec<Type> = (0..argc).map(|_| random_type(ctx.builder.rng())).collect();
    for (&v, ty) in open.inner_outputs.iter().zip(param_types) {
        ctx.builder.set_type(v, ty);
    }
    ctx.build_prefix();
    recurse_body(ctx, 4);
    ctx.builder.emit(close_opcode, vec![], Parameters::None);
}

pub fn plain_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    open_function(ctx, Opcode::BeginPlainFunction, Opcode::EndPlainFunction);
}

pub fn arrow_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    open_function(ctx, Opcode::BeginArrowFunction, Opcode::EndArrowFunction);
}

pub fn generator_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    open_function(ctx, Opcode::BeginGeneratorFunction, Opcode::EndGeneratorFunction);
}

pub fn async_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    open_function(ctx, Opcode::BeginAsyncFunction, Opcode::EndAsyncFunction);
}

pub fn async_generator_function_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    open_function(ctx, Opcode::BeginAsyncGeneratorFunction, Opcode::EndAsyncGeneratorFunction);
}

/// A class with 1-3 methods: `BeginClassDefinition` opens a block that
/// nests one or more `BeginClassMethod`/`EndClassMethod` pairs.
pub fn class_definition_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginClassDefinition, vec![], Parameters::None);
    let method_count = ctx.builder.rng().random_range(1..=3);
    for _ in 0..method_count {
        class_method_generator(ctx, &[]);
    }
    ctx.builder.emit(Opcode::EndClassDefinition, vec![], Parameters::None);
}

pub fn class_method_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let argc = ctx.builder.rng().random_range(0..=2);
    let open = ctx.builder.emit(Opcode::BeginClassMethod, vec![], Parameters::ArgumentCount(argc));
    let param_types: Vec<Type> = (0..argc).map(|_| random_type(ctx.builder.rng())).collect();
    for (&v, ty) in open.inner_outputs.iter().zip(param_types) {
        ctx.builder.set_type(v, ty);
    }
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndClassMethod, vec![], Parameters::None);
}

/// Opens a wasm module directly from JS and switches dispatch onto the
/// wasm-in-module registry for the body, so the function bodies nested
/// inside only ever see wasm-legal generators.
pub fn wasm_module_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
    ctx.with_wasm_module_registry(|inner| {
        let function_count = inner.builder.rng().random_range(1..=3);
        for _ in 0..function_count {
            crate::generators::wasm::wasm_function_generator(inner, &[]);
        }
    });
    ctx.builder.emit(Opcode::EndWasmModule, vec![], Parameters::None);
}

pub const ENTRIES: &[(GeneratorDescriptor, u32)] = &[
    (
        GeneratorDescriptor {
            name: "PlainFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: plain_function_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "ArrowFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: arrow_function_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "GeneratorFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: generator_function_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "AsyncFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: async_function_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "AsyncGeneratorFunctionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: async_generator_function_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "ClassDefinitionGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: class_definition_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "WasmModuleGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: wasm_module_generator,
        },
        1,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::registry::{RegistryKind, Registries};
    use fuzzil_builder::ProgramBuilder;
    use fuzzil_ir::Opcode;

    #[test]
    fn plain_function_balances_begin_and_end() {
        let mut builder = ProgramBuilder::new(11);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        ctx.set_current_remaining(0);
        plain_function_generator(&mut ctx, &[]);
        assert!(ctx.builder.code().check().is_ok());
    }

    #[test]
    fn wasm_module_restores_primary_registry_after_body() {
        let mut builder = ProgramBuilder::new(12);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        ctx.set_current_remaining(0);
        wasm_module_generator(&mut ctx, &[]);
        assert_eq!(ctx.active_registry_kind(), RegistryKind::Primary);
        assert!(ctx.builder.code().iter().any(|i| i.opcode == Opcode::BeginWasmModule));
    }
}
