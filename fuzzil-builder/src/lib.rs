//! The program builder: the single mutable carrier of generation state —
//! emission, the scope stack, the dense variable/type map, the per-builder
//! seeded RNG, and the mutation-engine-facing splice/truncate/replace
//! surface.
//!
//! This crate deliberately has no knowledge of the generator registry or
//! the dispatch engine (`fuzzil-engine`): the program builder and the
//! dispatch engine form a cycle, so the recursive, registry-driven
//! operations (`build`, `build_recursive`, `build_prefix`,
//! `generate_variable`) are implemented in `fuzzil-engine` on top of the
//! primitives exposed here (`emit`, `build_block`, `rand_var`/
//! `rand_var_of_type`, `type_of`/`set_type`) — see `DESIGN.md`.

pub mod builder;
pub mod mode;
pub mod scope;

pub use builder::ProgramBuilder;
pub use mode::BuilderMode;
