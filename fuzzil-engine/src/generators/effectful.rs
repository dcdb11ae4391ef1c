//! Effectful generators: property/element access, calls, operators,
//! reassignment, `typeof`/`instanceof`, exceptions, and loop/switch escapes —
//! the "effectful" opcode class, plus catalog-driven property and method
//! selection.

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use crate::generators::type_fns;
use fuzzil_ir::{BinaryOperator, CompareOperator, Context, Opcode, Parameters, Symbol, Type, UnaryOperator, Variable};
use rand::seq::SliceRandom;
use rand::Rng;

fn object_group_name_for(ctx: &mut GenContext, object: Variable) -> Option<Symbol> {
    ctx.builder.type_of(object).object_shape().and_then(|shape| shape.group)
}

pub fn property_load_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let name = object_group_name_for(ctx, object)
        .and_then(|g| ctx.builder.env().group(g).cloned())
        .and_then(|g| ctx.builder.env().random_property(&g, ctx.builder.rng()))
        .unwrap_or_else(|| Symbol::intern("length"));
    ctx.builder.emit(Opcode::GetProperty, vec![object], Parameters::PropertyName(name));
}

pub fn property_store_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let Some(value) = ctx.builder.rand_var() else { return };
    let name = object_group_name_for(ctx, object)
        .and_then(|g| ctx.builder.env().group(g).cloned())
        .and_then(|g| ctx.builder.env().random_property(&g, ctx.builder.rng()))
        .unwrap_or_else(|| Symbol::intern("x"));
    ctx.builder.emit(Opcode::SetProperty, vec![object, value], Parameters::PropertyName(name));
}

pub fn property_delete_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let name = object_group_name_for(ctx, object)
        .and_then(|g| ctx.builder.env().group(g).cloned())
        .and_then(|g| ctx.builder.env().random_property(&g, ctx.builder.rng()))
        .unwrap_or_else(|| Symbol::intern("x"));
    ctx.builder.emit(Opcode::DeleteProperty, vec![object], Parameters::PropertyName(name));
}

pub fn element_load_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let Some(index) = ctx.builder.rand_var_of_type(&Type::integer()) else { return };
    ctx.builder.emit(Opcode::GetElement, vec![object, index], Parameters::None);
}

pub fn element_store_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(object) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let Some(index) = ctx.builder.rand_var_of_type(&Type::integer()) else { return };
    let Some(value) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::SetElement, vec![object, index, value], Parameters::None);
}

pub fn function_call_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(callee) = ctx.builder.rand_var_of_type(&type_fns::any_function()) else { return };
    let argc = ctx.builder.rng().random_range(0..=3);
    let mut args = vec![callee];
    for _ in 0..argc {
        match ctx.builder.rand_var() {
            Some(v) => args.push(v),
            None => break,
        }
    }
    ctx.builder.emit(Opcode::CallFunction, args, Parameters::ArgumentCount(argc));
}

pub fn method_call_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(receiver) = ctx.builder.rand_var_of_type(&Type::plain_object()) else { return };
    let name = object_group_name_for(ctx, receiver)
        .and_then(|g| ctx.builder.env().group(g).cloned())
        .and_then(|g| ctx.builder.env().random_method(&g, ctx.builder.rng()))
        .unwrap_or_else(|| Symbol::intern("toString"));
    let argc = ctx.builder.rng().random_range(0..=3);
    let mut args = vec![receiver];
    for _ in 0..argc {
        match ctx.builder.rand_var() {
            Some(v) => args.push(v),
            None => break,
        }
    }
    ctx.builder.emit(Opcode::CallMethod, args, Parameters::PropertyName(name));
}

pub fn constructor_call_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(callee) = ctx.builder.rand_var_of_type(&type_fns::any_constructor()) else { return };
    let argc = ctx.builder.rng().random_range(0..=3);
    let mut args = vec![callee];
    for _ in 0..argc {
        match ctx.builder.rand_var() {
            Some(v) => args.push(v),
            None => break,
        }
    }
    ctx.builder.emit(Opcode::Construct, args, Parameters::ArgumentCount(argc));
}

const UNARY_OPS: &[UnaryOperator] = &[
    UnaryOperator::Neg,
    UnaryOperator::LogicalNot,
    UnaryOperator::BitwiseNot,
    UnaryOperator::Inc,
    UnaryOperator::Dec,
];

pub fn unary_operation_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(operand) = ctx.builder.rand_var() else { return };
    let op = *UNARY_OPS.choose(ctx.builder.rng()).expect("UNARY_OPS is never empty");
    ctx.builder.emit(Opcode::UnaryOperation, vec![operand], Parameters::UnaryOp(op));
}

const BINARY_OPS: &[BinaryOperator] = &[
    BinaryOperator::Add,
    BinaryOperator::Sub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Mod,
    BinaryOperator::Pow,
    BinaryOperator::BitAnd,
    BinaryOperator::BitOr,
    BinaryOperator::BitXor,
    BinaryOperator::ShiftLeft,
    BinaryOperator::ShiftRight,
    BinaryOperator::LogicalAnd,
    BinaryOperator::LogicalOr,
];

pub fn binary_operation_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(lhs) = ctx.builder.rand_var() else { return };
    let Some(rhs) = ctx.builder.rand_var() else { return };
    let op = *BINARY_OPS.choose(ctx.builder.rng()).expect("BINARY_OPS is never empty");
    ctx.builder.emit(Opcode::BinaryOperation, vec![lhs, rhs], Parameters::BinaryOp(op));
}

const COMPARE_OPS: &[CompareOperator] = &[
    CompareOperator::Equal,
    CompareOperator::NotEqual,
    CompareOperator::StrictEqual,
    CompareOperator::StrictNotEqual,
    CompareOperator::LessThan,
    CompareOperator::LessThanOrEqual,
    CompareOperator::GreaterThan,
    CompareOperator::GreaterThanOrEqual,
];

pub fn compare_operation_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(lhs) = ctx.builder.rand_var() else { return };
    let Some(rhs) = ctx.builder.rand_var() else { return };
    let op = *COMPARE_OPS.choose(ctx.builder.rng()).expect("COMPARE_OPS is never empty");
    ctx.builder.emit(Opcode::CompareOperation, vec![lhs, rhs], Parameters::CompareOp(op));
}

/// `v = newValue`: mutates an existing binding rather than allocating a
/// fresh variable, so unlike every value generator this does not widen the
/// population — it only risks narrowing `type(of: v)` back to `anything`
/// which `infer_output_type` correctly leaves untouched here since
/// `Reassign` declares zero outputs.
pub fn reassignment_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(target) = ctx.builder.rand_var() else { return };
    let Some(value) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::Reassign, vec![target, value], Parameters::None);
}

pub fn typeof_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(operand) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::TypeOf, vec![operand], Parameters::None);
}

pub fn instanceof_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(value) = ctx.builder.rand_var() else { return };
    let Some(ctor) = ctx.builder.rand_var_of_type(&type_fns::any_constructor()) else { return };
    ctx.builder.emit(Opcode::InstanceOf, vec![value, ctor], Parameters::None);
}

pub fn await_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(operand) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::Await, vec![operand], Parameters::None);
}

pub fn yield_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(operand) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::Yield, vec![operand], Parameters::None);
}

pub fn throw_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let Some(operand) = ctx.builder.rand_var() else { return };
    ctx.builder.emit(Opcode::ThrowException, vec![operand], Parameters::None);
}

pub fn loop_break_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::LoopBreak, vec![], Parameters::None);
}

pub fn loop_continue_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::LoopContinue, vec![], Parameters::None);
}

pub fn switch_break_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::SwitchBreak, vec![], Parameters::None);
}

pub const ENTRIES: &[(GeneratorDescriptor, u32)] = &[
    (
        GeneratorDescriptor {
            name: "PropertyLoadGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: property_load_generator,
        },
        5,
    ),
    (
        GeneratorDescriptor {
            name: "PropertyStoreGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: property_store_generator,
        },
        5,
    ),
    (
        GeneratorDescriptor {
            name: "PropertyDeleteGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: property_delete_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "ElementLoadGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object, Type::integer],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: element_load_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "ElementStoreGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object, Type::integer],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: element_store_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "FunctionCallGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[type_fns::any_function],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: function_call_generator,
        },
        5,
    ),
    (
        GeneratorDescriptor {
            name: "MethodCallGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[Type::plain_object],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: method_call_generator,
        },
        5,
    ),
    (
        GeneratorDescriptor {
            name: "ConstructorCallGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[type_fns::any_constructor],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: constructor_call_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "UnaryOperationGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: unary_operation_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "BinaryOperationGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: binary_operation_generator,
        },
        6,
    ),
    (
        GeneratorDescriptor {
            name: "CompareOperationGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: compare_operation_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "ReassignmentGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: reassignment_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "TypeOfGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: typeof_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "InstanceOfGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[type_fns::any_constructor],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: instanceof_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "AwaitGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::ASYNC_FUNCTION,
            produces: None,
            body: await_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "YieldGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::GENERATOR_FUNCTION,
            produces: None,
            body: yield_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "ThrowGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: throw_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "LoopBreakGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::LOOP,
            produces: None,
            body: loop_break_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "LoopContinueGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::LOOP,
            produces: None,
            body: loop_continue_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "SwitchBreakGenerator",
            is_value_generator: false,
            is_recursive: false,
            input_types: &[],
            required_context: Context::SWITCH_CASE,
            produces: None,
            body: switch_break_generator,
        },
        2,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::registry::Registries;
    use fuzzil_builder::ProgramBuilder;

    #[test]
    fn binary_operation_needs_two_existing_vars() {
        let mut builder = ProgramBuilder::new(7);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        super::super::value::integer_generator(&mut ctx, &[]);
        super::super::value::integer_generator(&mut ctx, &[]);
        binary_operation_generator(&mut ctx, &[]);
        assert!(ctx.builder.code().iter().any(|i| i.opcode == Opcode::BinaryOperation));
    }

    #[test]
    fn loop_break_outside_loop_is_rejected_by_emit() {
        let mut builder = ProgramBuilder::new(1);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            loop_break_generator(&mut ctx, &[]);
        }));
        assert!(result.is_err());
    }
}
