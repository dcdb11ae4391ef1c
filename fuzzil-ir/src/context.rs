//! The lexical/semantic context bitset tracked at every cursor position.
//!
//! A generator runs only where `required ⊆ current`. Using a bitset rather
//! than a `HashSet<ContextFlag>` makes that subset test, and the "OR of all
//! enclosing opened contexts" accumulation that holds at every cursor inside
//! a block, a single word operation — no dynamic dispatch needed.

use bitflags::bitflags;

bitflags! {
    /// Lexical/semantic context flags active at a cursor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct Context: u32 {
        /// The implicit root context; present everywhere.
        const JAVASCRIPT        = 1 << 0;
        const SUBROUTINE         = 1 << 1;
        const LOOP               = 1 << 2;
        const SWITCH_BLOCK       = 1 << 3;
        const SWITCH_CASE        = 1 << 4;
        const ASYNC_FUNCTION     = 1 << 5;
        const GENERATOR_FUNCTION = 1 << 6;
        const CLASS_DEFINITION   = 1 << 7;
        const OBJECT_LITERAL     = 1 << 8;
        const WITH               = 1 << 9;
        const WASM                = 1 << 10;
        const WASM_TYPE_GROUP    = 1 << 11;
        const WASM_FUNCTION      = 1 << 12;
        const WASM_BLOCK         = 1 << 13;
        const WASM_TRY           = 1 << 14;
        const TRY_BLOCK          = 1 << 15;
        const CATCH_BLOCK        = 1 << 16;
    }
}

impl Context {
    /// The implicit root context every program starts in.
    pub fn root() -> Self {
        Context::JAVASCRIPT
    }

    /// True iff every bit `self` requires is present in `current`.
    pub fn is_satisfied_by(self, current: Context) -> bool {
        current.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_test_is_bitwise() {
        let current = Context::JAVASCRIPT | Context::LOOP;
        assert!(Context::LOOP.is_satisfied_by(current));
        assert!(!Context::WASM.is_satisfied_by(current));
        assert!(Context::empty().is_satisfied_by(current));
    }

    #[test]
    fn root_contains_javascript_only() {
        assert_eq!(Context::root(), Context::JAVASCRIPT);
    }

    #[test]
    fn accumulation_is_union() {
        let outer = Context::JAVASCRIPT | Context::SUBROUTINE;
        let inner_opens = Context::LOOP;
        let at_cursor = outer | inner_opens;
        assert!(at_cursor.contains(Context::SUBROUTINE));
        assert!(at_cursor.contains(Context::LOOP));
    }
}
