//! The declarative runtime catalog and the type-system completeness helpers
//! the builder and generators need beyond the bare `Is`/`|` surface
//! `fuzzil-ir` provides.

pub mod environment;
pub mod type_ext;

pub use environment::{Builtin, Environment, Group, WASM_MAX_PAGES32, WASM_MAX_PAGES64, WASM_PAGE_SIZE};
pub use type_ext::{random_type, TypeExt};
