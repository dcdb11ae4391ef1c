//! Program templates: the named top-level seed-program shapes a worker
//! picks between before ever calling `build`. Each function here owns its
//! own [`fuzzil_builder::ProgramBuilder`] and [`crate::GenContext`] and
//! returns a finished [`Program`] tagged with the [`TemplateKind`] it was
//! built from. Every template runs its builder in
//! [`BuilderMode::Conservative`].

use crate::config::EngineConfig;
use crate::gen_context::GenContext;
use crate::registry::Registries;
use fuzzil_builder::{BuilderMode, ProgramBuilder};
use fuzzil_ir::{BinaryOperator, CompareOperator, Opcode, Parameters, Program, Symbol, TemplateKind, Type, Variable};
use rand::Rng;

fn new_conservative_builder(seed: u64) -> ProgramBuilder {
    ProgramBuilder::with_mode(seed, BuilderMode::Conservative)
}

/// Codegen50/Codegen100: the plain-JS baseline template, `build_prefix`
/// followed by one `build(n)` call of the requested size.
fn codegen(seed: u64, instruction_count: u32, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        ctx.build(instruction_count);
    }
    builder.into_program(Some(TemplateKind::Codegen))
}

pub fn codegen_50(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    codegen(seed, 50, registries, config)
}

pub fn codegen_100(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    codegen(seed, 100, registries, config)
}

/// A single wasm module containing one wasm function body of `instruction_count`.
fn wasm_codegen(seed: u64, instruction_count: u32, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
        ctx.with_wasm_module_registry(|inner| {
            inner.builder.emit(Opcode::BeginWasmFunction, vec![], Parameters::ArgumentCount(0));
            inner.build_prefix();
            inner.build(instruction_count);
            inner.builder.emit(Opcode::EndWasmFunction, vec![], Parameters::None);
        });
        ctx.builder.emit(Opcode::EndWasmModule, vec![], Parameters::None);
    }
    builder.into_program(Some(TemplateKind::WasmCodegen))
}

pub fn wasm_codegen_50(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    wasm_codegen(seed, 50, registries, config)
}

pub fn wasm_codegen_100(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    wasm_codegen(seed, 100, registries, config)
}

/// A JS prefix, a wasm module, then more JS: interleaves a JS `build` call
/// with a wasm module containing its own.
fn mixed_js_and_wasm(seed: u64, js_budget: u32, wasm_budget: u32, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        ctx.build(js_budget);
        ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
        ctx.with_wasm_module_registry(|inner| {
            inner.builder.emit(Opcode::BeginWasmFunction, vec![], Parameters::ArgumentCount(0));
            inner.build_prefix();
            inner.build(wasm_budget);
            inner.builder.emit(Opcode::EndWasmFunction, vec![], Parameters::None);
        });
        ctx.builder.emit(Opcode::EndWasmModule, vec![], Parameters::None);
        ctx.build(js_budget);
    }
    builder.into_program(Some(TemplateKind::MixedJsAndWasm))
}

pub fn mixed_js_and_wasm_1(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    mixed_js_and_wasm(seed, 30, 20, registries, config)
}

pub fn mixed_js_and_wasm_2(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    mixed_js_and_wasm(seed, 50, 40, registries, config)
}

/// Defines a plain function with a small body and returns the variable its
/// `BeginPlainFunction` binds in the enclosing scope (outputs are declared
/// before the call frame is pushed, so `callee` stays visible after `EndPlainFunction`).
fn define_simple_function(ctx: &mut GenContext, body_size: u32) -> Variable {
    let argc = ctx.builder.rng().random_range(1..=2);
    let open = ctx.builder.emit(Opcode::BeginPlainFunction, vec![], Parameters::ArgumentCount(argc));
    let callee = open.outputs[0];
    for &v in &open.inner_outputs {
        ctx.builder.set_type(v, Type::integer());
    }
    ctx.build_prefix();
    ctx.build(body_size);
    ctx.builder.emit(Opcode::EndPlainFunction, vec![], Parameters::None);
    callee
}

/// Calls `callee` inside a `for` loop sized well past a typical JIT's
/// tiering threshold, then once more outside the loop: calls the callee in
/// a loop >= 100 times, then calls it again afterwards to exercise the
/// optimized path.
fn call_in_repeat_loop(ctx: &mut GenContext, callee: Variable, iterations: i64) {
    let zero = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(0)).outputs[0];
    let limit = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(iterations)).outputs[0];
    let cond = ctx
        .builder
        .emit(Opcode::CompareOperation, vec![zero, limit], Parameters::CompareOp(CompareOperator::LessThan))
        .outputs[0];
    let open = ctx.builder.emit(Opcode::BeginForLoop, vec![cond], Parameters::None);
    ctx.builder.set_type(open.inner_outputs[0], Type::integer());
    let arg = ctx.generate_variable(&Type::integer());
    ctx.builder.emit(Opcode::CallFunction, vec![callee, arg], Parameters::ArgumentCount(1));
    ctx.builder.emit(Opcode::EndForLoop, vec![], Parameters::None);
    let arg_after = ctx.generate_variable(&Type::integer());
    ctx.builder.emit(Opcode::CallFunction, vec![callee, arg_after], Parameters::ArgumentCount(1));
}

/// JIT1Function: one hot function, called >= 100 times.
pub fn jit_1_function(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        let callee = define_simple_function(&mut ctx, 12);
        call_in_repeat_loop(&mut ctx, callee, 120);
    }
    builder.into_program(Some(TemplateKind::Jit))
}

/// JIT2Functions: two independently hot functions, each called >= 100
/// times, to surface cross-function inlining/deopt bugs.
pub fn jit_2_functions(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        let f1 = define_simple_function(&mut ctx, 10);
        let f2 = define_simple_function(&mut ctx, 10);
        call_in_repeat_loop(&mut ctx, f1, 120);
        call_in_repeat_loop(&mut ctx, f2, 120);
    }
    builder.into_program(Some(TemplateKind::Jit))
}

/// JITTrickyFunction: a hot loop whose body branches on the loop counter,
/// so only a fraction of iterations take the "rare" side — the shape most
/// likely to surface a JIT speculating on the wrong branch.
pub fn jit_tricky_function(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();
        let callee = define_simple_function(&mut ctx, 15);

        let zero = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(0)).outputs[0];
        let limit = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(150)).outputs[0];
        let cond = ctx
            .builder
            .emit(Opcode::CompareOperation, vec![zero, limit], Parameters::CompareOp(CompareOperator::LessThan))
            .outputs[0];
        let open = ctx.builder.emit(Opcode::BeginForLoop, vec![cond], Parameters::None);
        let loop_var = open.inner_outputs[0];
        ctx.builder.set_type(loop_var, Type::integer());

        let modulus = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(17)).outputs[0];
        let remainder = ctx
            .builder
            .emit(Opcode::BinaryOperation, vec![loop_var, modulus], Parameters::BinaryOp(BinaryOperator::Mod))
            .outputs[0];
        let rem_zero = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(0)).outputs[0];
        let fires = ctx
            .builder
            .emit(Opcode::CompareOperation, vec![remainder, rem_zero], Parameters::CompareOp(CompareOperator::Equal))
            .outputs[0];

        ctx.builder.emit(Opcode::BeginIf, vec![fires], Parameters::None);
        let rare_arg = ctx.generate_variable(&Type::integer());
        ctx.builder.emit(Opcode::CallFunction, vec![callee, rare_arg], Parameters::ArgumentCount(1));
        ctx.builder.emit(Opcode::BeginElse, vec![], Parameters::None);
        let common_arg = ctx.generate_variable(&Type::integer());
        ctx.builder.emit(Opcode::CallFunction, vec![callee, common_arg], Parameters::ArgumentCount(1));
        ctx.builder.emit(Opcode::EndIf, vec![], Parameters::None);
        ctx.builder.emit(Opcode::EndForLoop, vec![], Parameters::None);
    }
    builder.into_program(Some(TemplateKind::JitTrickyFunction))
}

/// JSPI: an async JS function awaiting a value, paired with a wasm module,
/// approximating the suspending-import/promising-export shape
/// JS-Promise-Integration fuzzing targets. `fuzzil-ir`'s wasm opcodes model
/// module/function structure but not cross-module import/export linking, so
/// the two halves are emitted side by side rather than wired together.
pub fn jspi(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();

        let open = ctx.builder.emit(Opcode::BeginAsyncFunction, vec![], Parameters::ArgumentCount(1));
        let async_callee = open.outputs[0];
        for &v in &open.inner_outputs {
            ctx.builder.set_type(v, Type::integer());
        }
        ctx.build_prefix();
        let awaited = ctx.generate_variable(&Type::integer());
        ctx.builder.emit(Opcode::Await, vec![awaited], Parameters::None);
        ctx.builder.emit(Opcode::EndAsyncFunction, vec![], Parameters::None);

        ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
        ctx.with_wasm_module_registry(|inner| {
            let open = inner.builder.emit(Opcode::BeginWasmFunction, vec![], Parameters::ArgumentCount(1));
            for &v in &open.inner_outputs {
                inner.builder.set_type(v, Type::wasm_i32());
            }
            inner.build_prefix();
            inner.build(6);
            inner.builder.emit(Opcode::EndWasmFunction, vec![], Parameters::None);
        });
        ctx.builder.emit(Opcode::EndWasmModule, vec![], Parameters::None);

        let arg = ctx.generate_variable(&Type::integer());
        ctx.builder.emit(Opcode::CallFunction, vec![async_callee, arg], Parameters::ArgumentCount(1));
    }
    builder.into_program(Some(TemplateKind::Jspi))
}

/// JSONFuzzer: stringifies a random value, optionally flips one character
/// of the resulting JSON text by XOR-ing its char code with a random 7-bit
/// mask, then re-parses under a `try`/`catch` guard — a mutated string
/// legitimately throws `SyntaxError` much of the time, so the parse is
/// never left unguarded.
pub fn json_fuzzer(seed: u64, registries: &Registries, config: &EngineConfig) -> Program {
    let mut builder = new_conservative_builder(seed);
    {
        let mut ctx = GenContext::new(&mut builder, registries, config);
        ctx.build_prefix();

        let value = ctx.generate_variable(&Type::anything());
        let json_builtin = ctx.builder.emit(Opcode::LoadBuiltin, vec![], Parameters::BuiltinName(Symbol::intern("JSON"))).outputs[0];
        let stringified = ctx
            .builder
            .emit(Opcode::CallMethod, vec![json_builtin, value], Parameters::PropertyName(Symbol::intern("stringify")))
            .outputs[0];
        ctx.builder.set_type(stringified, Type::string());

        let text_to_parse = if ctx.builder.rng().random_bool(0.5) {
            let mask = ctx.builder.rng().random_range(0..128);
            let index = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(0)).outputs[0];
            let char_code = ctx
                .builder
                .emit(Opcode::CallMethod, vec![stringified, index], Parameters::PropertyName(Symbol::intern("charCodeAt")))
                .outputs[0];
            ctx.builder.set_type(char_code, Type::integer());
            let mask_var = ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(mask)).outputs[0];
            let mutated_code = ctx
                .builder
                .emit(Opcode::BinaryOperation, vec![char_code, mask_var], Parameters::BinaryOp(BinaryOperator::BitXor))
                .outputs[0];
            let string_builtin = ctx.builder.emit(Opcode::LoadBuiltin, vec![], Parameters::BuiltinName(Symbol::intern("String"))).outputs[0];
            let mutated_char = ctx
                .builder
                .emit(Opcode::CallMethod, vec![string_builtin, mutated_code], Parameters::PropertyName(Symbol::intern("fromCharCode")))
                .outputs[0];
            ctx.builder.set_type(mutated_char, Type::string());
            mutated_char
        } else {
            stringified
        };

        ctx.builder.emit(Opcode::BeginTry, vec![], Parameters::None);
        let json_builtin_2 = ctx.builder.emit(Opcode::LoadBuiltin, vec![], Parameters::BuiltinName(Symbol::intern("JSON"))).outputs[0];
        ctx.builder
            .emit(Opcode::CallMethod, vec![json_builtin_2, text_to_parse], Parameters::PropertyName(Symbol::intern("parse")));
        let catch_open = ctx.builder.emit(Opcode::BeginCatch, vec![], Parameters::None);
        ctx.builder.set_type(catch_open.inner_outputs[0], Type::anything());
        ctx.builder.emit(Opcode::EndTryCatch, vec![], Parameters::None);
    }
    builder.into_program(Some(TemplateKind::JsonFuzzer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> (Registries, EngineConfig) {
        (Registries::new(), EngineConfig::default())
    }

    #[test]
    fn codegen_50_emits_at_least_fifty_instructions_and_checks_out() {
        let (registries, config) = env();
        let program = codegen_50(1, &registries, &config);
        assert!(program.code.len() >= 50);
        assert!(program.code.check().is_ok());
        assert_eq!(program.metadata.template, Some(TemplateKind::Codegen));
    }

    #[test]
    fn wasm_codegen_50_contains_a_wasm_module_and_checks_out() {
        let (registries, config) = env();
        let program = wasm_codegen_50(2, &registries, &config);
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginWasmModule));
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn mixed_js_and_wasm_1_interleaves_js_and_wasm() {
        let (registries, config) = env();
        let program = mixed_js_and_wasm_1(3, &registries, &config);
        assert!(program.code.iter().any(|i| i.opcode == Opcode::LoadBuiltin || i.opcode == Opcode::BinaryOperation || i.opcode == Opcode::LoadInt));
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginWasmModule));
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn jit_1_function_calls_the_callee_inside_and_outside_the_loop() {
        let (registries, config) = env();
        let program = jit_1_function(4, &registries, &config);
        let call_count = program.code.iter().filter(|i| i.opcode == Opcode::CallFunction).count();
        assert!(call_count >= 2);
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn jit_2_functions_defines_and_calls_both_functions() {
        let (registries, config) = env();
        let program = jit_2_functions(5, &registries, &config);
        let begin_count = program.code.iter().filter(|i| i.opcode == Opcode::BeginPlainFunction).count();
        assert_eq!(begin_count, 2);
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn jit_tricky_function_branches_on_the_loop_counter() {
        let (registries, config) = env();
        let program = jit_tricky_function(6, &registries, &config);
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginIf));
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginElse));
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn jspi_pairs_an_async_function_with_a_wasm_module() {
        let (registries, config) = env();
        let program = jspi(7, &registries, &config);
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginAsyncFunction));
        assert!(program.code.iter().any(|i| i.opcode == Opcode::Await));
        assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginWasmModule));
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn json_fuzzer_always_guards_the_reparse_with_try_catch() {
        let (registries, config) = env();
        for seed in 0..8 {
            let program = json_fuzzer(seed, &registries, &config);
            assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginTry));
            assert!(program.code.iter().any(|i| i.opcode == Opcode::BeginCatch));
            assert!(program.code.check().is_ok());
        }
    }

    #[test]
    fn templates_are_deterministic_given_the_same_seed() {
        let (registries, config) = env();
        let a = codegen_100(9, &registries, &config);
        let b = codegen_100(9, &registries, &config);
        assert_eq!(a.code, b.code);
    }
}
