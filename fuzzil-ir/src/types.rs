//! The `Type` lattice: primitive atoms, structural objects, callable
//! refinements, and wasm atoms, joined by a union operator.
//!
//! A `Type` is a bitset of "kinds" (`BaseType`) plus, when the bitset carries
//! a kind that needs one, a small side payload: an [`ObjectShape`] for
//! `OBJECT`, a [`Signature`] for `FUNCTION`/`CONSTRUCTOR`, or wasm reference
//! metadata for the indexed wasm kinds. Primitive unions (`integer | string`)
//! are therefore just two bits set in the same `Type`, with no payload at
//! all, which makes `Is` a single subset test rather than a recursive walk
//! over a tree of union nodes. Two distinct object shapes (or two distinct
//! signatures) unioned together is not a case this fuzzer's value population
//! actually produces, so only one payload slot per kind is kept; see `is()`
//! below for exactly what that costs.

use crate::symbol::Symbol;
use bitflags::bitflags;
use std::collections::BTreeSet;
use std::fmt;

bitflags! {
    /// Every concrete "kind" a value can have. A [`Type`] is a set of these
    /// plus, for the kinds that need one, a side payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct BaseType: u32 {
        const UNDEFINED   = 1 << 0;
        const NULL        = 1 << 1;
        const INTEGER     = 1 << 2;
        const FLOAT       = 1 << 3;
        const BIGINT      = 1 << 4;
        const BOOLEAN     = 1 << 5;
        const STRING      = 1 << 6;
        const REGEXP      = 1 << 7;
        const OBJECT      = 1 << 8;
        const FUNCTION    = 1 << 9;
        const CONSTRUCTOR = 1 << 10;
        const ITERABLE    = 1 << 11;

        const WASM_I32       = 1 << 12;
        const WASM_I64       = 1 << 13;
        const WASM_F32       = 1 << 14;
        const WASM_F64       = 1 << 15;
        const WASM_SIMD128   = 1 << 16;
        const WASM_EXTERNREF = 1 << 17;
        const WASM_FUNCREF   = 1 << 18;
        const WASM_EXNREF    = 1 << 19;
        const WASM_PACKED_I8  = 1 << 20;
        const WASM_PACKED_I16 = 1 << 21;
        const WASM_TYPE_GROUP_REF = 1 << 22;
        const WASM_LABELLED_BLOCK = 1 << 23;

        const NOTHING = 0;
    }
}

/// `{ properties: set<string>, methods: set<string>, group?: string }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ObjectShape {
    pub properties: BTreeSet<Symbol>,
    pub methods: BTreeSet<Symbol>,
    pub group: Option<Symbol>,
}

/// `(parameter-list) → returnType`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Signature {
    pub parameters: Vec<Type>,
    pub return_type: Box<Type>,
}

impl Signature {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        Signature {
            parameters,
            return_type: Box::new(return_type),
        }
    }
}

/// An indexed reference to a wasm type group (array, struct, self/forward ref).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WasmTypeGroupRef {
    pub index: u32,
    pub nullable: bool,
}

/// A labelled wasm block type with a parameter list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WasmBlockSignature {
    pub parameters: Vec<Type>,
}

/// A type in the lattice.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Type {
    base: BaseType,
    object: Option<ObjectShape>,
    signature: Option<Signature>,
    wasm_group: Option<WasmTypeGroupRef>,
    wasm_block: Option<WasmBlockSignature>,
}

impl Type {
    fn leaf(base: BaseType) -> Self {
        Type {
            base,
            object: None,
            signature: None,
            wasm_group: None,
            wasm_block: None,
        }
    }

    pub fn nothing() -> Self {
        Type::leaf(BaseType::NOTHING)
    }

    pub fn anything() -> Self {
        Type::leaf(BaseType::all())
    }

    pub fn integer() -> Self {
        Type::leaf(BaseType::INTEGER)
    }
    pub fn float() -> Self {
        Type::leaf(BaseType::FLOAT)
    }
    pub fn bigint() -> Self {
        Type::leaf(BaseType::BIGINT)
    }
    pub fn boolean() -> Self {
        Type::leaf(BaseType::BOOLEAN)
    }
    pub fn string() -> Self {
        Type::leaf(BaseType::STRING)
    }
    pub fn regexp() -> Self {
        Type::leaf(BaseType::REGEXP)
    }
    pub fn undefined() -> Self {
        Type::leaf(BaseType::UNDEFINED)
    }
    pub fn null() -> Self {
        Type::leaf(BaseType::NULL)
    }

    /// A structural object type, optionally iterable, optionally tagged with
    /// a builtin group name (e.g. `"Array"`, `"WasmMemory"`).
    pub fn object(properties: BTreeSet<Symbol>, methods: BTreeSet<Symbol>, group: Option<Symbol>) -> Self {
        Type {
            base: BaseType::OBJECT,
            object: Some(ObjectShape {
                properties,
                methods,
                group,
            }),
            ..Type::leaf(BaseType::NOTHING)
        }
    }

    /// The most generic object type: no required properties or methods.
    pub fn plain_object() -> Self {
        Type::object(BTreeSet::new(), BTreeSet::new(), None)
    }

    pub fn iterable(mut self) -> Self {
        self.base |= BaseType::ITERABLE;
        self
    }

    pub fn function(signature: Option<Signature>) -> Self {
        Type {
            base: BaseType::FUNCTION,
            signature,
            ..Type::leaf(BaseType::NOTHING)
        }
    }

    pub fn constructor(signature: Option<Signature>) -> Self {
        Type {
            base: BaseType::CONSTRUCTOR,
            signature,
            ..Type::leaf(BaseType::NOTHING)
        }
    }

    pub fn wasm_i32() -> Self {
        Type::leaf(BaseType::WASM_I32)
    }
    pub fn wasm_i64() -> Self {
        Type::leaf(BaseType::WASM_I64)
    }
    pub fn wasm_f32() -> Self {
        Type::leaf(BaseType::WASM_F32)
    }
    pub fn wasm_f64() -> Self {
        Type::leaf(BaseType::WASM_F64)
    }
    pub fn wasm_simd128() -> Self {
        Type::leaf(BaseType::WASM_SIMD128)
    }
    pub fn wasm_externref() -> Self {
        Type::leaf(BaseType::WASM_EXTERNREF)
    }
    pub fn wasm_funcref() -> Self {
        Type::leaf(BaseType::WASM_FUNCREF)
    }
    pub fn wasm_exnref() -> Self {
        Type::leaf(BaseType::WASM_EXNREF)
    }
    pub fn wasm_packed_i8() -> Self {
        Type::leaf(BaseType::WASM_PACKED_I8)
    }
    pub fn wasm_packed_i16() -> Self {
        Type::leaf(BaseType::WASM_PACKED_I16)
    }

    pub fn wasm_type_group_ref(index: u32, nullable: bool) -> Self {
        Type {
            base: BaseType::WASM_TYPE_GROUP_REF,
            wasm_group: Some(WasmTypeGroupRef { index, nullable }),
            ..Type::leaf(BaseType::NOTHING)
        }
    }

    pub fn wasm_labelled_block(parameters: Vec<Type>) -> Self {
        Type {
            base: BaseType::WASM_LABELLED_BLOCK,
            wasm_block: Some(WasmBlockSignature { parameters }),
            ..Type::leaf(BaseType::NOTHING)
        }
    }

    /// A bare type carrying only `base` bits and no payload. Low-level escape
    /// hatch for callers (e.g. `fuzzil-env`'s `TypeExt`) that need to rebuild
    /// a `Type` from a `BaseType` bitset produced by set arithmetic.
    pub fn from_base(base: BaseType) -> Self {
        Type::leaf(base)
    }

    pub fn base(&self) -> BaseType {
        self.base
    }

    pub fn object_shape(&self) -> Option<&ObjectShape> {
        self.object.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn wasm_group_ref(&self) -> Option<WasmTypeGroupRef> {
        self.wasm_group
    }

    pub fn is_nothing(&self) -> bool {
        self.base.is_empty()
    }

    pub fn is_anything(&self) -> bool {
        self.base == BaseType::all()
    }

    pub fn is_wasm(&self) -> bool {
        self.base.intersects(
            BaseType::WASM_I32
                | BaseType::WASM_I64
                | BaseType::WASM_F32
                | BaseType::WASM_F64
                | BaseType::WASM_SIMD128
                | BaseType::WASM_EXTERNREF
                | BaseType::WASM_FUNCREF
                | BaseType::WASM_EXNREF
                | BaseType::WASM_PACKED_I8
                | BaseType::WASM_PACKED_I16
                | BaseType::WASM_TYPE_GROUP_REF
                | BaseType::WASM_LABELLED_BLOCK,
        )
    }

    /// Union (`|`). Base bits simply combine; if both sides carry a payload
    /// for the same kind the left-hand side's payload wins — see the module
    /// doc comment for why two distinct shapes per kind aren't modeled.
    pub fn union(&self, other: &Type) -> Type {
        Type {
            base: self.base | other.base,
            object: self.object.clone().or_else(|| other.object.clone()),
            signature: self.signature.clone().or_else(|| other.signature.clone()),
            wasm_group: self.wasm_group.or(other.wasm_group),
            wasm_block: self.wasm_block.clone().or_else(|| other.wasm_block.clone()),
        }
    }

    /// Structural subtype test: does every value matching `self` also match
    /// `other`? A structural subtype test.
    pub fn is(&self, other: &Type) -> bool {
        if other.is_anything() {
            return true;
        }
        if self.is_nothing() {
            return true;
        }
        if !other.base.contains(self.base) {
            return false;
        }
        if other.base.contains(BaseType::OBJECT) {
            match (&self.object, &other.object) {
                (Some(have), Some(want)) => {
                    if !want.properties.is_subset(&have.properties) {
                        return false;
                    }
                    if !want.methods.is_subset(&have.methods) {
                        return false;
                    }
                    if let Some(group) = want.group {
                        if have.group != Some(group) {
                            return false;
                        }
                    }
                }
                (None, Some(want)) if !want.properties.is_empty() || !want.methods.is_empty() || want.group.is_some() => {
                    return false;
                }
                _ => {}
            }
        }
        if other.base.contains(BaseType::FUNCTION) || other.base.contains(BaseType::CONSTRUCTOR) {
            if let Some(want_sig) = &other.signature {
                match &self.signature {
                    Some(have_sig) => {
                        if have_sig.parameters.len() != want_sig.parameters.len() {
                            return false;
                        }
                        if !have_sig.return_type.is(&want_sig.return_type) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }
}

impl std::ops::BitOr for Type {
    type Output = Type;
    fn bitor(self, rhs: Type) -> Type {
        self.union(&rhs)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anything() {
            return write!(f, ".anything");
        }
        if self.is_nothing() {
            return write!(f, ".nothing");
        }
        write!(f, "{:?}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anything_is_top_nothing_is_bottom() {
        assert!(Type::integer().is(&Type::anything()));
        assert!(Type::nothing().is(&Type::string()));
        assert!(!Type::anything().is(&Type::integer()));
    }

    #[test]
    fn primitive_union_distributes() {
        let required = Type::integer() | Type::float();
        assert!(Type::integer().is(&required));
        assert!(!(Type::integer() | Type::string()).is(&required));
    }

    #[test]
    fn object_subtyping_is_structural() {
        let mut props = BTreeSet::new();
        props.insert(Symbol::intern("length"));
        props.insert(Symbol::intern("push"));
        let rich = Type::object(props.clone(), BTreeSet::new(), None);

        let mut want = BTreeSet::new();
        want.insert(Symbol::intern("length"));
        let required = Type::object(want, BTreeSet::new(), None);

        assert!(rich.is(&required));
        assert!(!required.is(&rich));
    }

    #[test]
    fn object_group_must_match_exactly() {
        let array_group = Some(Symbol::intern("Array"));
        let an_array = Type::object(BTreeSet::new(), BTreeSet::new(), array_group);
        let wants_array = Type::object(BTreeSet::new(), BTreeSet::new(), array_group);
        let wants_map = Type::object(BTreeSet::new(), BTreeSet::new(), Some(Symbol::intern("Map")));
        assert!(an_array.is(&wants_array));
        assert!(!an_array.is(&wants_map));
    }

    #[test]
    fn function_with_any_signature_satisfies_unconstrained_function() {
        let sig = Signature::new(vec![Type::integer()], Type::string());
        let specific = Type::function(Some(sig));
        let unconstrained = Type::function(None);
        assert!(specific.is(&unconstrained));
    }

    #[test]
    fn wasm_atoms_are_distinct_kinds() {
        assert!(!Type::wasm_i32().is(&Type::wasm_i64()));
        assert!(Type::wasm_i32().is(&Type::wasm_i32()));
    }
}
