//! The declarative, process-wide catalog describing the target JS/Wasm
//! runtime: builtin names with types and signatures, named object
//! archetypes ("groups"), well-known symbol names, and the wasm memory
//! constants templates and generators consult.

use fuzzil_ir::{Signature, Symbol, Type};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// A named object archetype, e.g. `"Array"`, `"WasmMemory"`.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: Symbol,
    pub properties: BTreeSet<Symbol>,
    pub methods: BTreeSet<Symbol>,
}

impl Group {
    fn new(name: &str, properties: &[&str], methods: &[&str]) -> Self {
        Group {
            name: Symbol::intern(name),
            properties: properties.iter().map(|s| Symbol::intern(s)).collect(),
            methods: methods.iter().map(|s| Symbol::intern(s)).collect(),
        }
    }

    /// The structural [`Type`] a variable bound to this group carries.
    pub fn as_type(&self) -> Type {
        Type::object(self.properties.clone(), self.methods.clone(), Some(self.name))
    }
}

/// One registered builtin: a name paired with its type and signature.
#[derive(Debug, Clone)]
pub struct Builtin {
    pub name: Symbol,
    pub ty: Type,
}

/// Wasm memory constants.
pub const WASM_PAGE_SIZE: u32 = 65_536;
pub const WASM_MAX_PAGES32: u32 = 65_536;
pub const WASM_MAX_PAGES64: u32 = 1 << 48;

/// The process-wide, read-only-after-construction environment catalog.
/// `OnceLock`-initialized; no interior mutability needed after construction.
#[derive(Debug)]
pub struct Environment {
    builtins: Vec<Builtin>,
    groups: Vec<Group>,
    well_known_symbols: Vec<Symbol>,
    js_type_names: Vec<&'static str>,
}

impl Environment {
    fn new() -> Self {
        let groups = vec![
            Group::new(
                "Array",
                &["length"],
                &["push", "pop", "shift", "unshift", "slice", "splice", "map", "filter", "reduce", "forEach", "indexOf", "concat", "join", "sort", "reverse"],
            ),
            Group::new("String", &["length"], &["slice", "indexOf", "split", "replace", "toUpperCase", "toLowerCase", "charAt", "concat", "trim"]),
            Group::new("Map", &["size"], &["get", "set", "has", "delete", "clear", "keys", "values", "entries"]),
            Group::new("Set", &["size"], &["add", "has", "delete", "clear", "values"]),
            Group::new("Promise", &[], &["then", "catch", "finally"]),
            Group::new("RegExp", &["source", "flags", "lastIndex"], &["test", "exec"]),
            Group::new(
                "ArrayBuffer",
                &["byteLength"],
                &["slice"],
            ),
            Group::new(
                "TypedArray",
                &["length", "byteLength", "byteOffset", "buffer"],
                &["set", "subarray", "slice", "fill"],
            ),
            Group::new("DataView", &["byteLength", "byteOffset", "buffer"], &["getInt32", "setInt32", "getFloat64", "setFloat64"]),
            Group::new("WasmMemory", &["buffer"], &["grow"]),
            Group::new("WasmModule", &["exports"], &[]),
            Group::new("WasmInstance", &["exports"], &[]),
            Group::new("WasmGlobal", &["value"], &[]),
            Group::new("WasmTable", &["length"], &["get", "set", "grow"]),
            Group::new("Proxy", &[], &[]),
        ];

        let array_ty = groups.iter().find(|g| g.name == Symbol::intern("Array")).unwrap().as_type();
        let promise_ty = groups.iter().find(|g| g.name == Symbol::intern("Promise")).unwrap().as_type();

        let builtins = vec![
            Builtin { name: Symbol::intern("Object"), ty: Type::object(BTreeSet::new(), ["keys", "values", "entries", "assign", "freeze", "defineProperty", "getPrototypeOf"].into_iter().map(Symbol::intern).collect(), None) },
            Builtin { name: Symbol::intern("Array"), ty: Type::constructor(Some(Signature::new(vec![Type::integer()], array_ty.clone()))) },
            Builtin { name: Symbol::intern("Math"), ty: Type::object(BTreeSet::new(), ["abs", "floor", "ceil", "round", "max", "min", "pow", "sqrt", "random", "log", "sin", "cos"].into_iter().map(Symbol::intern).collect(), None) },
            Builtin { name: Symbol::intern("JSON"), ty: Type::object(BTreeSet::new(), ["stringify", "parse"].into_iter().map(Symbol::intern).collect(), None) },
            Builtin { name: Symbol::intern("Promise"), ty: Type::constructor(Some(Signature::new(vec![Type::function(None)], promise_ty))) },
            Builtin { name: Symbol::intern("Reflect"), ty: Type::object(BTreeSet::new(), ["get", "set", "has", "ownKeys", "apply", "construct", "deleteProperty"].into_iter().map(Symbol::intern).collect(), None) },
            Builtin { name: Symbol::intern("Proxy"), ty: Type::constructor(Some(Signature::new(vec![Type::plain_object(), Type::plain_object()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("ArrayBuffer"), ty: Type::constructor(Some(Signature::new(vec![Type::integer()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("Uint8Array"), ty: Type::constructor(Some(Signature::new(vec![Type::integer()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("Int32Array"), ty: Type::constructor(Some(Signature::new(vec![Type::integer()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("Float64Array"), ty: Type::constructor(Some(Signature::new(vec![Type::integer()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("DataView"), ty: Type::constructor(Some(Signature::new(vec![Type::plain_object()], Type::plain_object()))) },
            Builtin { name: Symbol::intern("String"), ty: Type::object(BTreeSet::new(), ["fromCharCode", "fromCodePoint", "raw"].into_iter().map(Symbol::intern).collect(), None) },
            Builtin { name: Symbol::intern("Map"), ty: Type::constructor(None) },
            Builtin { name: Symbol::intern("Set"), ty: Type::constructor(None) },
            Builtin { name: Symbol::intern("WebAssembly"), ty: Type::object(BTreeSet::new(), ["instantiate", "compile", "validate"].into_iter().map(Symbol::intern).collect(), None) },
        ];

        let well_known_symbols = [
            "Symbol.iterator",
            "Symbol.asyncIterator",
            "Symbol.toPrimitive",
            "Symbol.toStringTag",
            "Symbol.hasInstance",
        ]
        .into_iter()
        .map(Symbol::intern)
        .collect();

        let js_type_names = vec![
            "number", "string", "boolean", "object", "function", "undefined", "bigint", "symbol",
        ];

        Environment { builtins, groups, well_known_symbols, js_type_names }
    }

    /// The process-wide catalog, built once and shared read-only after
    /// initialization.
    pub fn global() -> &'static Environment {
        static ENV: OnceLock<Environment> = OnceLock::new();
        ENV.get_or_init(Environment::new)
    }

    pub fn builtins(&self) -> &[Builtin] {
        &self.builtins
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: Symbol) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn well_known_symbols(&self) -> &[Symbol] {
        &self.well_known_symbols
    }

    pub fn js_type_names(&self) -> &[&'static str] {
        &self.js_type_names
    }

    /// A uniformly random registered builtin, used by the builder to
    /// resolve `LoadBuiltin`.
    pub fn rand_builtin(&self, rng: &mut impl Rng) -> &Builtin {
        self.builtins.iter().choose(rng).expect("builtin catalog is never empty")
    }

    /// Select a builtin matching a required type hint, falling back to any
    /// builtin if none match.
    pub fn builtin_of_type(&self, ty: &Type, rng: &mut impl Rng) -> &Builtin {
        self.builtins
            .iter()
            .filter(|b| b.ty.is(ty))
            .choose(rng)
            .unwrap_or_else(|| self.rand_builtin(rng))
    }

    /// A uniformly random member of a group's declared property set, if the
    /// group has any.
    pub fn random_property(&self, group: &Group, rng: &mut impl Rng) -> Option<Symbol> {
        group.properties.iter().choose(rng).copied()
    }

    /// A uniformly random member of a group's declared method set, if any.
    pub fn random_method(&self, group: &Group, rng: &mut impl Rng) -> Option<Symbol> {
        group.methods.iter().choose(rng).copied()
    }

    /// A uniformly random group (used to pick an archetype for `CreateObject`
    /// followed by property/method access generators).
    pub fn random_group(&self, rng: &mut impl Rng) -> &Group {
        self.groups.iter().choose(rng).expect("group catalog is never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn global_environment_is_singleton() {
        let a = Environment::global() as *const Environment;
        let b = Environment::global() as *const Environment;
        assert_eq!(a, b);
    }

    #[test]
    fn array_group_has_push_method() {
        let env = Environment::global();
        let array = env.group(Symbol::intern("Array")).unwrap();
        assert!(array.methods.contains(&Symbol::intern("push")));
    }

    #[test]
    fn rand_builtin_is_deterministic_given_seed() {
        let env = Environment::global();
        let mut a = ChaCha8Rng::seed_from_u64(3);
        let mut b = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(env.rand_builtin(&mut a).name, env.rand_builtin(&mut b).name);
    }

    #[test]
    fn builtin_of_type_prefers_matching_constructors() {
        let env = Environment::global();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let found = env.builtin_of_type(&Type::constructor(None), &mut rng);
        assert!(found.ty.is(&Type::constructor(None)));
    }
}
