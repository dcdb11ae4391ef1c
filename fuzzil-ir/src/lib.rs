//! The typed intermediate language ("FuzzIL") generated programs are built
//! out of: variables, the type lattice, the context bitset, instructions,
//! and `Code`/`Program` containers, plus the splice/truncate/replace surface
//! the mutation engine consumes.
//!
//! This crate has no knowledge of the generator registry, the dispatch
//! engine, or the environment catalog — it is the data model those
//! components are built on top of (`fuzzil-env`, `fuzzil-builder`,
//! `fuzzil-engine`).

pub mod code;
pub mod context;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod symbol;
pub mod types;
pub mod variable;

pub use code::Code;
pub use context::Context;
pub use error::{ILError, Result};
pub use instruction::{BinaryOperator, CompareOperator, Instruction, Parameters, UnaryOperator};
pub use opcode::{BlockFamily, BlockKind, Opcode, OpcodeClass, OpcodeDescriptor};
pub use program::{Program, ProgramMetadata, TemplateKind};
pub use symbol::Symbol;
pub use types::{ObjectShape, Signature, Type, WasmBlockSignature, WasmTypeGroupRef};
pub use variable::{Variable, VariableAllocator};
