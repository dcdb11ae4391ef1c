//! IL-level error types.
//!
//! These represent programming errors only (invariant violations).
//! Generator self-abort and recursion-budget exhaustion never surface as an
//! `Err` — they are silent "emitted zero instructions" returns observed by
//! the dispatch engine, not core errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ILError>;

/// A well-formedness violation in a [`crate::code::Code`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ILError {
    #[error("instruction {index}: block opener/closer mismatch (expected close for {expected_family:?}, found {found:?})")]
    UnbalancedBlock {
        index: usize,
        expected_family: Option<crate::opcode::BlockFamily>,
        found: crate::opcode::Opcode,
    },

    #[error("instruction {index}: unmatched block closer {opcode:?} with nothing open")]
    UnmatchedCloser { index: usize, opcode: crate::opcode::Opcode },

    #[error("instruction {index}: program ended with {count} block(s) still open")]
    UnclosedBlocks { index: usize, count: usize },

    #[error("instruction {index}: input variable {var} is used before it is defined")]
    UseBeforeDef { index: usize, var: crate::variable::Variable },

    #[error("instruction {index}: input variable {var} is out of scope at this point")]
    OutOfScope { index: usize, var: crate::variable::Variable },

    #[error("instruction {index}: output variable {var} is already defined")]
    DuplicateOutput { index: usize, var: crate::variable::Variable },

    #[error("instruction {index}: opcode {opcode:?} requires context {required:?}, but current context is {current:?}")]
    ContextViolation {
        index: usize,
        opcode: crate::opcode::Opcode,
        required: crate::context::Context,
        current: crate::context::Context,
    },

    #[error("instruction {index}: opcode {opcode:?} requires a surrounding block of kind {expected:?}")]
    WrongSurroundingBlock {
        index: usize,
        opcode: crate::opcode::Opcode,
        expected: crate::opcode::BlockKind,
    },
}
