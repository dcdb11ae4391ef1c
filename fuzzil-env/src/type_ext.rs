//! Type system completeness helpers that `Is`/`|` alone don't give callers:
//! set subtraction/intersection over the primitive lattice, and a
//! representative default-literal hint per wasm atom for value generators
//! that need *something* plausible to emit.

use fuzzil_ir::types::BaseType;
use fuzzil_ir::{Parameters, Type};
use rand::Rng;

/// Extension surface over [`Type`] that doesn't belong in `fuzzil-ir` itself
/// because it's consumed only by the builder/generators, not by the IL
/// well-formedness model.
pub trait TypeExt {
    /// Values matching `self` but not `other` (used by `randVar(ofType:)`
    /// candidate filtering to exclude a narrower excluded shape).
    fn subtract(&self, other: &Type) -> Type;

    /// Values matching both `self` and `other`.
    fn intersect(&self, other: &Type) -> Type;

    /// A representative literal for this wasm atom, for generators that need
    /// to materialize a value but have no lifter to defer to.
    fn wasm_default_value_hint(&self) -> Option<Parameters>;
}

impl TypeExt for Type {
    fn subtract(&self, other: &Type) -> Type {
        let base = self.base() & !other.base();
        carry_payload(self, base)
    }

    fn intersect(&self, other: &Type) -> Type {
        let base = self.base() & other.base();
        carry_payload(self, base)
    }

    fn wasm_default_value_hint(&self) -> Option<Parameters> {
        if self.base().contains(BaseType::WASM_I32) {
            Some(Parameters::Int(0))
        } else if self.base().contains(BaseType::WASM_I64) {
            Some(Parameters::Int(0))
        } else if self.base().contains(BaseType::WASM_F32) || self.base().contains(BaseType::WASM_F64) {
            Some(Parameters::Float(0.0))
        } else if self.base().contains(BaseType::WASM_EXTERNREF) || self.base().contains(BaseType::WASM_FUNCREF) {
            None // null reference: the generator emits LoadNull instead
        } else {
            None
        }
    }
}

/// Keeps `self`'s object/signature/wasm payload only if the resulting
/// base bitset still carries the kind that payload belongs to.
fn carry_payload(original: &Type, base: BaseType) -> Type {
    let mut result = Type::from_base(base);
    if base.contains(BaseType::OBJECT) {
        if let Some(shape) = original.object_shape() {
            result = Type::object(shape.properties.clone(), shape.methods.clone(), shape.group)
                .union(&Type::from_base(base & !BaseType::OBJECT));
        }
    }
    if base.contains(BaseType::FUNCTION) || base.contains(BaseType::CONSTRUCTOR) {
        if let Some(sig) = original.signature() {
            let ctor = Type::constructor(Some(sig.clone()));
            let func = Type::function(Some(sig.clone()));
            let chosen = if base.contains(BaseType::CONSTRUCTOR) { ctor } else { func };
            result = chosen.union(&Type::from_base(base & !BaseType::FUNCTION & !BaseType::CONSTRUCTOR));
        }
    }
    result
}

/// Draws from a weighted family of primitives, arrays, and structural
/// objects, used by templates for random signatures. Never reads a global
/// RNG — always takes the caller's per-builder `ChaCha8Rng` by mutable
/// reference.
pub fn random_type(rng: &mut impl Rng) -> Type {
    const WEIGHTS: &[(u32, fn() -> Type)] = &[
        (5, Type::integer),
        (4, Type::float),
        (2, Type::bigint),
        (3, Type::boolean),
        (5, Type::string),
        (1, Type::regexp),
        (3, plain_array),
        (2, Type::plain_object),
    ];
    let total: u32 = WEIGHTS.iter().map(|(w, _)| *w).sum();
    let mut pick = rng.random_range(0..total);
    for (weight, ctor) in WEIGHTS {
        if pick < *weight {
            return ctor();
        }
        pick -= *weight;
    }
    Type::anything()
}

fn plain_array() -> Type {
    Type::plain_object().iterable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn subtract_removes_bits() {
        let union = Type::integer() | Type::float();
        let just_integer = union.subtract(&Type::float());
        assert!(just_integer.is(&Type::integer()));
        assert!(!just_integer.is(&Type::float()));
    }

    #[test]
    fn intersect_keeps_common_bits() {
        let a = Type::integer() | Type::float() | Type::string();
        let b = Type::float() | Type::string() | Type::boolean();
        let both = a.intersect(&b);
        assert!(both.is(&Type::float()));
        assert!(both.is(&Type::string()));
        assert!(!both.is(&Type::integer()));
        assert!(!both.is(&Type::boolean()));
    }

    #[test]
    fn wasm_i32_hint_is_zero() {
        assert_eq!(Type::wasm_i32().wasm_default_value_hint(), Some(Parameters::Int(0)));
        assert_eq!(Type::wasm_externref().wasm_default_value_hint(), None);
    }

    #[test]
    fn random_type_is_deterministic_given_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let drawn_a: Vec<_> = (0..20).map(|_| random_type(&mut a).base()).collect();
        let drawn_b: Vec<_> = (0..20).map(|_| random_type(&mut b).base()).collect();
        assert_eq!(drawn_a, drawn_b);
    }
}
