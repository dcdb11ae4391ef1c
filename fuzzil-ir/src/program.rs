//! `Program`: a [`Code`] plus metadata.

use crate::code::Code;

/// Which top-level template produced a program, kept for diagnostics and for
/// downstream consumers that branch on it (e.g. the minimizer treating
/// JIT templates differently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TemplateKind {
    Codegen,
    WasmCodegen,
    MixedJsAndWasm,
    Jit,
    JitTrickyFunction,
    Jspi,
    JsonFuzzer,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProgramMetadata {
    pub template: Option<TemplateKind>,
    pub seed: u64,
}

impl ProgramMetadata {
    pub fn new(template: Option<TemplateKind>, seed: u64) -> Self {
        ProgramMetadata { template, seed }
    }
}

/// A sealed aggregate exposed to the lifter and mutation engine: `Code`
/// plus whatever metadata those downstream consumers need.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub code: Code,
    pub metadata: ProgramMetadata,
}

impl Program {
    pub fn new(code: Code, metadata: ProgramMetadata) -> Self {
        Program { code, metadata }
    }
}
