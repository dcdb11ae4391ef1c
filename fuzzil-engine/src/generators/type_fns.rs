//! Zero-argument `fn() -> Type` constructors used as `input_types`/`produces`
//! entries in [`crate::descriptor::GeneratorDescriptor`]. `Type`'s own
//! associated functions (`Type::integer`, `Type::plain_object`, ...) already
//! have this shape and are used directly where possible; this module only
//! adds the handful of composite shapes (an unconstrained function, a plain
//! iterable) that need a non-trivial body.

use fuzzil_ir::Type;

pub fn any_function() -> Type {
    Type::function(None)
}

pub fn any_constructor() -> Type {
    Type::constructor(None)
}

pub fn any_iterable() -> Type {
    Type::plain_object().iterable()
}

pub fn any_numeric() -> Type {
    Type::integer() | Type::float() | Type::bigint()
}

pub fn any_wasm_numeric() -> Type {
    Type::wasm_i32() | Type::wasm_i64() | Type::wasm_f32() | Type::wasm_f64()
}
