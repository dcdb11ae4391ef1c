//! Public facade over the fuzzil program-synthesis core. Downstream
//! collaborators — the mutation engine, the corpus/coverage loop, a lifter
//! emitting real JS/Wasm text, or a CLI driving all three — depend on this
//! crate rather than reaching into the four workspace members directly.
//!
//! This crate re-exports its member crates' public surfaces rather than
//! defining behavior of its own.

pub use fuzzil_builder::{BuilderMode, ProgramBuilder};
pub use fuzzil_engine::{templates, EngineConfig, GenContext, GeneratorDescriptor, GeneratorRegistry, Registries, RegistryKind, WeightOverrides};
pub use fuzzil_env::{Builtin, Environment, Group, TypeExt};
pub use fuzzil_ir::{
    BinaryOperator, BlockFamily, BlockKind, Code, CompareOperator, Context, ILError, Instruction, Opcode, OpcodeClass,
    OpcodeDescriptor, Parameters, Program, ProgramMetadata, Signature, Symbol, TemplateKind, Type, UnaryOperator,
    Variable, VariableAllocator,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codegen_50_from_an_empty_builder_satisfies_the_bootstrap_liveness_guarantee() {
        let registries = Registries::new();
        let config = EngineConfig::default();
        let program = templates::codegen_50(0, &registries, &config);
        assert!(program.code.len() >= 50);
        assert!(program.code.iter().any(|i| i.opcode == Opcode::LoadInt));
        assert!(program.code.check().is_ok());
    }

    #[test]
    fn deterministic_given_same_seed_and_registry() {
        let registries = Registries::new();
        let config = EngineConfig::default();
        let a = templates::codegen_50(42, &registries, &config);
        let b = templates::codegen_50(42, &registries, &config);
        assert_eq!(a.code, b.code);
    }

    #[test]
    fn jit_1_function_round_trips_through_the_mutation_surface() {
        // ProgramBuilder::splice_at/truncate_at are the mutation-engine-facing
        // surface this facade re-exports.
        let registries = Registries::new();
        let config = EngineConfig::default();
        let program = templates::jit_1_function(11, &registries, &config);
        let mut builder = ProgramBuilder::new(12);
        builder.splice_at(0, &program.code, 0);
        assert!(builder.code().check().is_ok());
    }
}
