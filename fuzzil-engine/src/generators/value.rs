//! JS value generators: empty declared input types, required context of
//! plain `javascript`. These are the only generators `build_prefix`/
//! `generate_variable` may select, and the only ones eligible to seed the
//! bootstrap population ("3 values per kind").

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use fuzzil_ir::{Context, Opcode, Parameters, Type, Variable};
use rand::Rng;

const SAMPLE_STRINGS: &[&str] = &["", "a", "hello", "🦀", "0", "undefined", "[object Object]", "\u{0}"];
const SAMPLE_REGEXP_PATTERNS: &[&str] = &["a+", "[0-9]+", "^foo$", "(ab)*c", "\\d{2,4}"];
const SAMPLE_REGEXP_FLAGS: &[&str] = &["", "g", "i", "gi", "gimsu"];

pub fn integer_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let value: i64 = match ctx.builder.rng().random_range(0..4) {
        0 => 0,
        1 => ctx.builder.rng().random_range(-128..=127),
        2 => ctx.builder.rng().random_range(i32::MIN as i64..=i32::MAX as i64),
        _ => ctx.builder.rng().random_range(-10_000_000_000i64..=10_000_000_000i64),
    };
    ctx.builder.emit(Opcode::LoadInt, vec![], Parameters::Int(value));
}

pub fn float_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let value = match ctx.builder.rng().random_range(0..5) {
        0 => 0.0,
        1 => f64::NAN,
        2 => f64::INFINITY,
        3 => -f64::INFINITY,
        _ => ctx.builder.rng().random_range(-1e10..=1e10),
    };
    ctx.builder.emit(Opcode::LoadFloat, vec![], Parameters::Float(value));
}

pub fn bigint_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let value = ctx.builder.rng().random_range(-1_000_000_000i64..=1_000_000_000i64);
    ctx.builder.emit(Opcode::LoadBigInt, vec![], Parameters::BigInt(value));
}

pub fn boolean_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let value = ctx.builder.rng().random_bool(0.5);
    ctx.builder.emit(Opcode::LoadBool, vec![], Parameters::Bool(value));
}

pub fn string_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let s = SAMPLE_STRINGS[ctx.builder.rng().random_range(0..SAMPLE_STRINGS.len())].to_string();
    ctx.builder.emit(Opcode::LoadString, vec![], Parameters::Str(s));
}

pub fn regexp_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let pattern = SAMPLE_REGEXP_PATTERNS[ctx.builder.rng().random_range(0..SAMPLE_REGEXP_PATTERNS.len())].to_string();
    let flags = SAMPLE_REGEXP_FLAGS[ctx.builder.rng().random_range(0..SAMPLE_REGEXP_FLAGS.len())].to_string();
    ctx.builder.emit(Opcode::LoadRegExp, vec![], Parameters::RegExp { pattern, flags });
}

pub fn undefined_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::LoadUndefined, vec![], Parameters::None);
}

pub fn null_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::LoadNull, vec![], Parameters::None);
}

/// Gathers 0-3 existing in-scope variables as array elements, via
/// `CreateArray`'s variadic input count.
pub fn array_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let count = ctx.builder.rng().random_range(0..=3);
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        match ctx.builder.rand_var() {
            Some(v) => elements.push(v),
            None => break,
        }
    }
    let n = elements.len();
    ctx.builder.emit(Opcode::CreateArray, elements, Parameters::ElementCount(n));
}

/// A plain empty object; properties are added afterward by the dedicated
/// property-store generator rather than inline here — structural objects
/// are populated incrementally through `SetProperty`.
pub fn object_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    ctx.builder.emit(Opcode::CreateObject, vec![], Parameters::ElementCount(0));
}

/// Loads a uniformly random registered builtin.
pub fn builtin_generator(ctx: &mut GenContext, _inputs: &[Variable]) {
    let name = ctx.builder.env().rand_builtin(ctx.builder.rng()).name;
    ctx.builder.emit(Opcode::LoadBuiltin, vec![], Parameters::BuiltinName(name));
}

pub const ENTRIES: &[(GeneratorDescriptor, u32)] = &[
    (
        GeneratorDescriptor {
            name: "IntegerGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::integer]),
            body: integer_generator,
        },
        6,
    ),
    (
        GeneratorDescriptor {
            name: "FloatGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::float]),
            body: float_generator,
        },
        4,
    ),
    (
        GeneratorDescriptor {
            name: "BigIntGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::bigint]),
            body: bigint_generator,
        },
        2,
    ),
    (
        GeneratorDescriptor {
            name: "BooleanGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::boolean]),
            body: boolean_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "StringGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::string]),
            body: string_generator,
        },
        5,
    ),
    (
        GeneratorDescriptor {
            name: "RegExpGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::regexp]),
            body: regexp_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "UndefinedGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::undefined]),
            body: undefined_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "NullGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::null]),
            body: null_generator,
        },
        1,
    ),
    (
        GeneratorDescriptor {
            name: "ArrayGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[crate::generators::type_fns::any_iterable]),
            body: array_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "ObjectGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: Some(&[Type::plain_object]),
            body: object_generator,
        },
        3,
    ),
    (
        GeneratorDescriptor {
            name: "BuiltinGenerator",
            is_value_generator: true,
            is_recursive: false,
            input_types: &[],
            required_context: Context::JAVASCRIPT,
            produces: None,
            body: builtin_generator,
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
    fn integer_generator_emits_exactly_one_load_int_per_call() {
        let mut builder = ProgramBuilder::new(0);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = GenContext::new(&mut builder, &registries, &config);
        for _ in 0..3 {
            integer_generator(&mut ctx, &[]);
        }
        let load_int_count = ctx.builder.code().iter().filter(|i| i.opcode == Opcode::LoadInt).count();
        assert_eq!(load_int_count, 3);
    }
}
