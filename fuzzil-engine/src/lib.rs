//! The generator registry, weighted dispatch engine, and program templates.
//!
//! This crate is the one place aware of both `fuzzil-ir` and `fuzzil-builder`
//! at once, plus the table of generator bodies; the builder/dispatch mutual
//! reference lives entirely inside [`GenContext`], which every generator
//! body and template receives as its one handle onto both the emission
//! surface and the registry.

pub mod config;
pub mod descriptor;
mod dispatch;
pub mod gen_context;
pub mod generators;
pub mod registry;
pub mod templates;

pub use config::EngineConfig;
pub use descriptor::{GeneratorBody, GeneratorDescriptor};
pub use gen_context::GenContext;
pub use registry::{GeneratorRegistry, RegistryKind, Registries, WeightOverrides};
