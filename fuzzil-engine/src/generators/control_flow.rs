//! Recursive, block-opening generators: conditionals, loops, switch, try,
//! and `with` — the "block-opening" opcode class.
//!
//! Every generator here follows the same shape: emit the `Begin*` opcode
//! (allocating any inner outputs — loop variables, catch bindings), recurse
//! into `ctx.build_recursive` for the body at a budget fraction of the
//! caller's remaining instructions, then emit the matching `End*`.

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use fuzzil_ir::{Context, Opcode, Parameters, Type, Variable};
use rand::Rng;

fn recurse_body(ctx: &mut GenContext, of_n: u32) {
    let remaining = ctx.current_remaining().max(0) as u32;
    ctx.build_recursive(0, of_n, remaining);
}

pub fn if_else_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(cond) = ctx.builder.rand_var_of_type(&Type::boolean()) else { return };
    ctx.builder.emit(Opcode::BeginIf, vec![cond], Parameters::None);
    recurse_body(ctx, 2);
    if ctx.builder.rng().random_bool(0.5) {
        ctx.builder.emit(Opcode::BeginElse, vec![], Parameters::None);
        recurse_body(ctx, 2);
    }
    ctx.builder.emit(Opcode::EndIf, vec![], Parameters::None);
}

pub fn for_loop_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(cond) = ctx.builder.rand_var_of_type(&Type::boolean()) else { return };
    let open = ctx.builder.emit(Opcode::BeginForLoop, vec![cond], Parameters::None);
    let loop_var = open.inner_outputs[0];
    ctx.builder.set_type(loop_var, Type::integer());
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndForLoop, vec![], Parameters::None);
}

pub fn while_loop_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(cond) = ctx.builder.rand_var_of_type(&Type::boolean()) else { return };
    ctx.builder.emit(Opcode::BeginWhileLoop, vec![cond], Parameters::None);
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndWhileLoop, vec![], Parameters::None);
}

pub fn for_in_loop_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let open = ctx.builder.emit(Opcode::BeginForInLoop, vec![object], Parameters::None);
    ctx.builder.set_type(open.inner_outputs[0], Type::string());
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndForInLoop, vec![], Parameters::None);
}

pub fn for_of_loop_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&(Type::plain_object().iterable())) else { return };
    let open = ctx.builder.emit(Opcode::BeginForOfLoop, vec![object], Parameters::None);
    ctx.builder.set_type(open.inner_outputs[0], Type::anything());
    recurse_body(ctx, 3);
    ctx.builder.emit(Opcode::EndForOfLoop, vec![], Parameters::None);
}

/// `switch` with 1-4 cases: `BeginSwitch`/`BeginSwitchCase` pairs nested
/// inside one `BeginSwitch`/`EndSwitch`.
pub fn switch_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(discriminant) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::BeginSwitch, vec![discriminant], Parameters::None);
    let case_count = ctx.builder.rng().random_range(1..=4);
    for _ in 0..case_count {
        ctx.builder.emit(Opcode::BeginSwitchCase, vec![], Parameters::None);
        recurse_body(ctx, case_count as u32);
        ctx.builder.emit(Opcode::EndSwitchCase, vec![], Parameters::None);
    }
    ctx.builder.emit(Opcode::EndSwitch, vec![], Parameters::None);
}

/// `try`/`catch`/`finally`: `BeginTry`, optional `BeginCatch` with one inner
/// output, optional `BeginFinally`, one shared `EndTryCatch`. At least one
/// of catch/finally is always present so the block stays well-formed under
/// `Code::check`'s context-requirement rule.
pub fn try_catch_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::BeginTry, vec![], Parameters::None);
    recurse_body(ctx, 3);
    let want_finally = ctx.builder.rng().random_bool(0.4);
    let open = ctx.builder.emit(Opcode::BeginCatch, vec![], Parameters::None);
    ctx.builder.set_type(open.inner_outputs[0], Type::anything());
    recurse_body(ctx, 3);
    if want_finally {
        ctx.builder.emit(Opcode::BeginFinally, vec![], Parameters::None);
        recurse_body(ctx, 3);
    }
    ctx.builder.emit(Opcode::EndTryCatch, vec![], Parameters::None);
}

pub fn with_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    ctx.builder.emit(Opcode::BeginWith, vec![object], Parameters::None);
    recurse_body(ctx, 2);
    ctx.builder.emit(Opcode::EndWith, vec![], Parameters::None);
}

pub const ENTRIES: &[(GeneratorDescriptor, u32)] = &[
    (
        GeneratorDescriptor {
            name: "IfElseGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[Type::boolean],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: if_else_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "ForLoopGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[Type::boolean],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: for_loop_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "WhileLoopGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[Type::boolean],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: while_loop_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "ForInLoopGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: for_in_loop_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "ForOfLoopGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: for_of_loop_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "SwitchGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: switch_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "TryCatchGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: try_catch_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "WithGenerator",
            is_value_generator: false,
            is_recursive: true,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: with_generator,
        },
        1,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::registry::Registries;
    use fuzzil_builder::ProgramBuilder;

    #[test]
    fn if_else_without_recursion_budget_still_closes_the_block() {
        let mut builder = ProgramBuilder::new(5);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        super::super::value::boolean_generator(&mut ctx, &[]);
        ctx.set_current_remaining(0);
        if_else_generator(&mut ctx, &[]);
        let opens = ctx.builder.code().iter().filter(|i| i.opcode == Opcode::BeginIf).count();
        let closes = ctx.builder.code().iter().filter(|i| i.opcode == Opcode::EndIf).count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn try_catch_always_balances() {
        let mut builder = ProgramBuilder::new(6);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        ctx.set_current_remaining(0);
        try_catch_generator(&mut ctx, &[]);
        assert!(ctx.builder.code().check().is_ok());
    }
}
