//! [`GeneratorDescriptor`]: the static shape of one generator — a name, its
//! value-generator/recursive flags, its declared input types and required
//! context, what it's expected to produce, and its body.

use crate::gen_context::GenContext;
use fuzzil_ir::{Context, Type, Variable};

/// A generator's body. Plain `fn` pointers rather than boxed closures: every
/// generator in the registry is a free function with no captured state, so
/// there's nothing a closure would buy beyond an extra allocation and a
/// vtable indirection per call.
pub type GeneratorBody = fn(&mut GenContext, &[Variable]);

/// One entry in a [`crate::GeneratorRegistry`].
#[derive(Clone, Copy)]
pub struct GeneratorDescriptor {
    pub name: &'static str,
    /// Value generators produce a new variable from nothing and are the only
    /// generators `buildPrefix` and `generateVariable` are allowed to pick.
    pub is_value_generator: bool,
    /// Recursive generators call back into `GenContext::build`/`build_recursive`
    /// for sub-block bodies and are excluded once the remaining budget drops
    /// below `EngineConfig::recursion_floor`.
    pub is_recursive: bool,
    pub input_types: &'static [fn() -> Type],
    pub required_context: Context,
    /// The set of kinds this generator is expected to leave behind, used by
    /// `generateVariable(ofType:)` to pick a candidate when no existing
    /// variable satisfies the request. `None` for effectful generators.
    pub produces: Option<&'static [fn() -> Type]>,
    pub body: GeneratorBody,
}

impl std::fmt::Debug for GeneratorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorDescriptor").field("name", &self.name).finish_non_exhaustive()
    }
}

impl GeneratorDescriptor {
    pub fn input_types_resolved(&self) -> Vec<Type> {
        self.input_types.iter().map(|f| f()).collect()
    }

    pub fn produces_resolved(&self) -> Option<Vec<Type>> {
        self.produces.map(|ps| ps.iter().map(|f| f()).collect())
    }
}
