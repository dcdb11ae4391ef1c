//! Opcodes and their static descriptors.
//!
//! Every opcode falls into one of four classes and statically declares
//! `num_inputs`, `num_outputs`, `num_inner_outputs`, the context bits it
//! opens, the context bits required to emit it, and (for a handful of
//! block-openers such as `Else`) which kind of surrounding block it must be
//! nested in.

use crate::context::Context;

/// The four orthogonal opcode classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    ValueCreating,
    Effectful,
    BlockOpening,
    BlockClosing,
}

/// A family of matched block-openers/closers, used for LIFO matching and for
/// `requiresSurroundingBlockOfKind` (e.g. `Else` requires an open `If`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFamily {
    If,
    Loop,
    Switch,
    SwitchCase,
    Function,
    Class,
    ClassMethod,
    With,
    Try,
    WasmModule,
    WasmFunction,
    WasmBlock,
    WasmTry,
    WasmTypeGroup,
}

/// The specific kind of an open block frame, used to disambiguate within a
/// family (e.g. an `If`'s `Then` branch vs. its `Else` branch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    IfThen,
    IfElse,
    ForLoop,
    WhileLoop,
    ForInLoop,
    ForOfLoop,
    Switch,
    SwitchCase,
    PlainFunction,
    ArrowFunction,
    GeneratorFunction,
    AsyncFunction,
    AsyncGeneratorFunction,
    ClassDefinition,
    ClassMethod,
    With,
    Try,
    Catch,
    Finally,
    WasmModule,
    WasmFunction,
    WasmBlock,
    WasmLoop,
    WasmTry,
    WasmTypeGroup,
}

impl BlockKind {
    pub fn family(self) -> BlockFamily {
        use BlockFamily as F;
        use BlockKind as K;
        match self {
            K::IfThen | K::IfElse => F::If,
            K::ForLoop | K::WhileLoop | K::ForInLoop | K::ForOfLoop | K::WasmLoop => F::Loop,
            K::Switch => F::Switch,
            K::SwitchCase => F::SwitchCase,
            K::PlainFunction | K::ArrowFunction | K::GeneratorFunction | K::AsyncFunction | K::AsyncGeneratorFunction => F::Function,
            K::ClassDefinition => F::Class,
            K::ClassMethod => F::ClassMethod,
            K::With => F::With,
            K::Try | K::Catch | K::Finally => F::Try,
            K::WasmModule => F::WasmModule,
            K::WasmFunction => F::WasmFunction,
            K::WasmBlock => F::WasmBlock,
            K::WasmTry => F::WasmTry,
            K::WasmTypeGroup => F::WasmTypeGroup,
        }
    }
}

/// Every opcode the core can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Opcode {
    // --- value-creating ---
    LoadInt,
    LoadFloat,
    LoadBigInt,
    LoadBool,
    LoadString,
    LoadRegExp,
    LoadUndefined,
    LoadNull,
    CreateArray,
    CreateObject,
    LoadBuiltin,
    CreateNamedVariable,

    // --- effectful ---
    GetProperty,
    SetProperty,
    DeleteProperty,
    GetElement,
    SetElement,
    CallFunction,
    CallMethod,
    Construct,
    UnaryOperation,
    BinaryOperation,
    CompareOperation,
    Reassign,
    TypeOf,
    InstanceOf,
    Await,
    Yield,
    ThrowException,
    LoopBreak,
    LoopContinue,
    SwitchBreak,

    // --- block-opening ---
    BeginIf,
    BeginElse,
    BeginForLoop,
    BeginWhileLoop,
    BeginForInLoop,
    BeginForOfLoop,
    BeginSwitch,
    BeginSwitchCase,
    BeginPlainFunction,
    BeginArrowFunction,
    BeginGeneratorFunction,
    BeginAsyncFunction,
    BeginAsyncGeneratorFunction,
    BeginClassDefinition,
    BeginClassMethod,
    BeginWith,
    BeginTry,
    BeginCatch,
    BeginFinally,
    BeginWasmModule,
    BeginWasmFunction,
    BeginWasmBlock,
    BeginWasmLoop,
    BeginWasmTry,
    BeginWasmTypeGroup,

    // --- block-closing ---
    EndIf,
    EndForLoop,
    EndWhileLoop,
    EndForInLoop,
    EndForOfLoop,
    EndSwitch,
    EndSwitchCase,
    EndPlainFunction,
    EndArrowFunction,
    EndGeneratorFunction,
    EndAsyncFunction,
    EndAsyncGeneratorFunction,
    EndClassDefinition,
    EndClassMethod,
    EndWith,
    EndTryCatch,
    EndWasmModule,
    EndWasmFunction,
    EndWasmBlock,
    EndWasmLoop,
    EndWasmTry,
    EndWasmTypeGroup,

    // --- wasm type-group members (value-creating; emitted only inside a
    //     `BeginWasmTypeGroup` block) ---
    WasmDefineArrayType,
    WasmDefineStructType,
    WasmDefineForwardReference,
    WasmResolveForwardReference,
}

/// Static metadata for one opcode.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeDescriptor {
    pub class: OpcodeClass,
    pub num_inputs: usize,
    /// `None` means "variadic", used by calls/array/object literals whose
    /// input count depends on the instruction (argument count, element
    /// count). The actual count at a given instruction is `inputs.len()`.
    pub variadic_inputs: bool,
    pub num_outputs: usize,
    pub num_inner_outputs: usize,
    pub opens_context: Context,
    pub requires_context: Context,
    pub opens_block: Option<BlockKind>,
    pub closes_family: Option<BlockFamily>,
    pub requires_surrounding_block_of_kind: Option<BlockKind>,
}

const fn d(
    class: OpcodeClass,
    num_inputs: usize,
    variadic_inputs: bool,
    num_outputs: usize,
    num_inner_outputs: usize,
) -> OpcodeDescriptor {
    OpcodeDescriptor {
        class,
        num_inputs,
        variadic_inputs,
        num_outputs,
        num_inner_outputs,
        opens_context: Context::empty(),
        requires_context: Context::empty(),
        opens_block: None,
        closes_family: None,
        requires_surrounding_block_of_kind: None,
    }
}

impl Opcode {
    /// Static, opcode-intrinsic descriptor. Does not depend on any particular
    /// instance of the opcode (e.g. a `CreateArray`'s actual input count is a
    /// property of the instruction, not the opcode).
    pub fn descriptor(self) -> OpcodeDescriptor {
        use BlockFamily as F;
        use BlockKind as K;
        use Context as C;
        use Opcode::*;
        use OpcodeClass::*;

        match self {
            LoadInt | LoadFloat | LoadBigInt | LoadBool | LoadString | LoadRegExp | LoadUndefined | LoadNull => {
                d(ValueCreating, 0, false, 1, 0)
            }
            CreateArray => d(ValueCreating, 0, true, 1, 0),
            CreateObject => d(ValueCreating, 0, true, 1, 0),
            LoadBuiltin => d(ValueCreating, 0, false, 1, 0),
            CreateNamedVariable => d(ValueCreating, 0, true, 1, 0),

            GetProperty => d(Effectful, 1, false, 1, 0),
            SetProperty => d(Effectful, 2, false, 0, 0),
            DeleteProperty => d(Effectful, 1, false, 0, 0),
            GetElement => d(Effectful, 2, false, 1, 0),
            SetElement => d(Effectful, 3, false, 0, 0),
            CallFunction => d(Effectful, 1, true, 1, 0),
            CallMethod => d(Effectful, 1, true, 1, 0),
            Construct => d(Effectful, 1, true, 1, 0),
            UnaryOperation => d(Effectful, 1, false, 1, 0),
            BinaryOperation => d(Effectful, 2, false, 1, 0),
            CompareOperation => d(Effectful, 2, false, 1, 0),
            Reassign => d(Effectful, 2, false, 0, 0),
            TypeOf => d(Effectful, 1, false, 1, 0),
            InstanceOf => d(Effectful, 2, false, 1, 0),
            Await => {
                let mut o = d(Effectful, 1, false, 1, 0);
                o.requires_context = C::ASYNC_FUNCTION;
                o
            }
            Yield => {
                let mut o = d(Effectful, 1, false, 1, 0);
                o.requires_context = C::GENERATOR_FUNCTION;
                o
            }
            ThrowException => d(Effectful, 1, false, 0, 0),
            LoopBreak | LoopContinue => {
                let mut o = d(Effectful, 0, false, 0, 0);
                o.requires_context = C::LOOP;
                o
            }
            SwitchBreak => {
                let mut o = d(Effectful, 0, false, 0, 0);
                o.requires_context = C::SWITCH_CASE;
                o
            }

            BeginIf => {
                let mut o = d(BlockOpening, 1, false, 0, 0);
                o.opens_block = Some(K::IfThen);
                o
            }
            BeginElse => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::IfElse);
                o.closes_family = Some(F::If);
                o.requires_surrounding_block_of_kind = Some(K::IfThen);
                o
            }
            BeginForLoop => {
                let mut o = d(BlockOpening, 1, false, 0, 1);
                o.opens_block = Some(K::ForLoop);
                o.opens_context = C::LOOP;
                o
            }
            BeginWhileLoop => {
                let mut o = d(BlockOpening, 1, false, 0, 0);
                o.opens_block = Some(K::WhileLoop);
                o.opens_context = C::LOOP;
                o
            }
            BeginForInLoop => {
                let mut o = d(BlockOpening, 1, false, 0, 1);
                o.opens_block = Some(K::ForInLoop);
                o.opens_context = C::LOOP;
                o
            }
            BeginForOfLoop => {
                let mut o = d(BlockOpening, 1, false, 0, 1);
                o.opens_block = Some(K::ForOfLoop);
                o.opens_context = C::LOOP;
                o
            }
            BeginSwitch => {
                let mut o = d(BlockOpening, 1, false, 0, 0);
                o.opens_block = Some(K::Switch);
                o.opens_context = C::SWITCH_BLOCK;
                o
            }
            BeginSwitchCase => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::SwitchCase);
                o.opens_context = C::SWITCH_CASE;
                o.requires_context = C::SWITCH_BLOCK;
                o.requires_surrounding_block_of_kind = Some(K::Switch);
                o
            }
            BeginPlainFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::PlainFunction);
                o.opens_context = C::SUBROUTINE;
                o
            }
            BeginArrowFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::ArrowFunction);
                o.opens_context = C::SUBROUTINE;
                o
            }
            BeginGeneratorFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::GeneratorFunction);
                o.opens_context = C::from_bits_truncate(C::SUBROUTINE.bits() | C::GENERATOR_FUNCTION.bits());
                o
            }
            BeginAsyncFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::AsyncFunction);
                o.opens_context = C::from_bits_truncate(C::SUBROUTINE.bits() | C::ASYNC_FUNCTION.bits());
                o
            }
            BeginAsyncGeneratorFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::AsyncGeneratorFunction);
                o.opens_context = C::from_bits_truncate(
                    C::SUBROUTINE.bits() | C::ASYNC_FUNCTION.bits() | C::GENERATOR_FUNCTION.bits(),
                );
                o
            }
            BeginClassDefinition => {
                let mut o = d(BlockOpening, 0, false, 1, 0);
                o.opens_block = Some(K::ClassDefinition);
                o.opens_context = C::CLASS_DEFINITION;
                o
            }
            BeginClassMethod => {
                let mut o = d(BlockOpening, 0, true, 0, 0);
                o.opens_block = Some(K::ClassMethod);
                o.opens_context = C::SUBROUTINE;
                o.requires_context = C::CLASS_DEFINITION;
                o.requires_surrounding_block_of_kind = Some(K::ClassDefinition);
                o
            }
            BeginWith => {
                let mut o = d(BlockOpening, 1, false, 0, 0);
                o.opens_block = Some(K::With);
                o.opens_context = C::WITH;
                o
            }
            BeginTry => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::Try);
                o.opens_context = C::TRY_BLOCK;
                o
            }
            BeginCatch => {
                let mut o = d(BlockOpening, 0, false, 0, 1);
                o.opens_block = Some(K::Catch);
                o.opens_context = C::CATCH_BLOCK;
                o.closes_family = Some(F::Try);
                o.requires_surrounding_block_of_kind = Some(K::Try);
                o
            }
            BeginFinally => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::Finally);
                o.closes_family = Some(F::Try);
                o
            }

            BeginWasmModule => {
                let mut o = d(BlockOpening, 0, false, 1, 0);
                o.opens_block = Some(K::WasmModule);
                o.opens_context = C::WASM;
                o
            }
            BeginWasmFunction => {
                let mut o = d(BlockOpening, 0, true, 1, 0);
                o.opens_block = Some(K::WasmFunction);
                o.opens_context = C::from_bits_truncate(C::WASM.bits() | C::WASM_FUNCTION.bits());
                o.requires_context = C::WASM;
                o
            }
            BeginWasmBlock => {
                let mut o = d(BlockOpening, 0, true, 0, 0);
                o.opens_block = Some(K::WasmBlock);
                o.opens_context = C::WASM_BLOCK;
                o.requires_context = C::WASM;
                o
            }
            BeginWasmLoop => {
                let mut o = d(BlockOpening, 0, true, 0, 0);
                o.opens_block = Some(K::WasmLoop);
                o.opens_context = C::from_bits_truncate(C::WASM_BLOCK.bits() | C::LOOP.bits());
                o.requires_context = C::WASM;
                o
            }
            BeginWasmTry => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::WasmTry);
                o.opens_context = C::WASM_TRY;
                o.requires_context = C::WASM;
                o
            }
            BeginWasmTypeGroup => {
                let mut o = d(BlockOpening, 0, false, 0, 0);
                o.opens_block = Some(K::WasmTypeGroup);
                o.opens_context = C::WASM_TYPE_GROUP;
                o.requires_context = C::WASM;
                o
            }

            EndIf => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::If);
                o
            }
            EndForLoop => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Loop);
                o
            }
            EndWhileLoop => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Loop);
                o
            }
            EndForInLoop => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Loop);
                o
            }
            EndForOfLoop => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Loop);
                o
            }
            EndSwitch => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Switch);
                o
            }
            EndSwitchCase => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::SwitchCase);
                o
            }
            EndPlainFunction | EndArrowFunction | EndGeneratorFunction | EndAsyncFunction | EndAsyncGeneratorFunction => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Function);
                o
            }
            EndClassDefinition => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Class);
                o
            }
            EndClassMethod => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::ClassMethod);
                o
            }
            EndWith => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::With);
                o
            }
            EndTryCatch => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Try);
                o
            }
            EndWasmModule => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::WasmModule);
                o
            }
            EndWasmFunction => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::WasmFunction);
                o
            }
            EndWasmBlock => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::WasmBlock);
                o
            }
            EndWasmLoop => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::Loop);
                o
            }
            EndWasmTry => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::WasmTry);
                o
            }
            EndWasmTypeGroup => {
                let mut o = d(BlockClosing, 0, false, 0, 0);
                o.closes_family = Some(F::WasmTypeGroup);
                o
            }

            WasmDefineArrayType | WasmDefineStructType | WasmDefineForwardReference => {
                let mut o = d(ValueCreating, 0, true, 1, 0);
                o.requires_context = C::WASM_TYPE_GROUP;
                o
            }
            WasmResolveForwardReference => {
                let mut o = d(Effectful, 1, false, 0, 0);
                o.requires_context = C::WASM_TYPE_GROUP;
                o
            }
        }
    }

    pub fn is_block_opener(self) -> bool {
        self.descriptor().opens_block.is_some()
    }

    pub fn is_block_closer(self) -> bool {
        matches!(self.descriptor().class, OpcodeClass::BlockClosing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_creating_opcodes_have_exactly_one_output() {
        assert_eq!(Opcode::LoadInt.descriptor().num_outputs, 1);
        assert_eq!(Opcode::LoadInt.descriptor().num_inputs, 0);
    }

    #[test]
    fn await_requires_async_context() {
        assert_eq!(Opcode::Await.descriptor().requires_context, Context::ASYNC_FUNCTION);
    }

    #[test]
    fn else_requires_surrounding_if_then() {
        let desc = Opcode::BeginElse.descriptor();
        assert_eq!(desc.requires_surrounding_block_of_kind, Some(BlockKind::IfThen));
        assert_eq!(desc.closes_family, Some(BlockFamily::If));
    }

    #[test]
    fn for_loop_opens_inner_output_and_loop_context() {
        let desc = Opcode::BeginForLoop.descriptor();
        assert_eq!(desc.num_inner_outputs, 1);
        assert!(desc.opens_context.contains(Context::LOOP));
    }
}
