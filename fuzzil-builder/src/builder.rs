//! `ProgramBuilder`: the single mutable carrier of generation state. Owns
//! emission, the scope stack, the dense variable-to-type map, and a
//! per-builder seeded RNG; exposes the mutation-engine-facing
//! splice/truncate/replace surface.

use crate::mode::BuilderMode;
use crate::scope::ScopeStack;
use fuzzil_env::Environment;
use fuzzil_ir::{
    Code, Instruction, Opcode, Parameters, Program, ProgramMetadata, TemplateKind, Type, UnaryOperator, Variable,
    VariableAllocator,
};
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The program builder. One instance per fuzzing worker per generated
/// program; reset between programs.
pub struct ProgramBuilder {
    code: Code,
    var_alloc: VariableAllocator,
    var_types: Vec<Type>,
    scope: ScopeStack,
    rng: ChaCha8Rng,
    seed: u64,
    mode: BuilderMode,
    env: &'static Environment,
}

impl ProgramBuilder {
    pub fn new(seed: u64) -> Self {
        Self::with_mode(seed, BuilderMode::default())
    }

    pub fn with_mode(seed: u64, mode: BuilderMode) -> Self {
        ProgramBuilder {
            code: Code::new(),
            var_alloc: VariableAllocator::new(),
            var_types: Vec::new(),
            scope: ScopeStack::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            mode,
            env: Environment::global(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mode(&self) -> BuilderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BuilderMode) {
        self.mode = mode;
    }

    pub fn env(&self) -> &'static Environment {
        self.env
    }

    /// The per-builder seeded RNG; generators must never read a global RNG.
    /// Exposed `&mut` so dispatch and generator bodies share the one
    /// deterministic stream.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// The context bitset active at the current cursor.
    pub fn context(&self) -> fuzzil_ir::Context {
        self.scope.current_context()
    }

    pub fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    /// The [`BlockKind`] of the innermost open frame, or `None` at the root.
    /// Used by the dispatch engine to auto-close a terminal block when no
    /// generator is applicable.
    pub fn current_block_kind(&self) -> Option<fuzzil_ir::BlockKind> {
        self.scope.current_kind()
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn into_program(self, template: Option<TemplateKind>) -> Program {
        Program::new(self.code, ProgramMetadata::new(template, self.seed))
    }

    fn alloc(&mut self, ty: Type) -> Variable {
        let v = self.var_alloc.alloc();
        self.var_types.push(ty);
        v
    }

    /// The current inferred type of `v`.
    pub fn type_of(&self, v: Variable) -> Type {
        self.var_types.get(v.index() as usize).cloned().unwrap_or_else(Type::anything)
    }

    /// Explicit type refinement, for generators that know more than
    /// `infer_output_type` can (e.g. after populating an object literal's
    /// properties, or resolving a wasm type-group forward reference).
    pub fn set_type(&mut self, v: Variable, ty: Type) {
        if let Some(slot) = self.var_types.get_mut(v.index() as usize) {
            *slot = ty;
        }
    }

    /// A uniformly random variable currently in scope, or `None` if the
    /// scope is empty.
    pub fn rand_var(&mut self) -> Option<Variable> {
        self.scope.visible_vars().choose(&mut self.rng)
    }

    /// A uniformly random in-scope variable whose current type satisfies
    /// `T` via structural subtyping.
    pub fn rand_var_of_type(&mut self, ty: &Type) -> Option<Variable> {
        let candidates: Vec<Variable> = self
            .scope
            .visible_vars()
            .filter(|&v| self.type_of(v).is(ty))
            .collect();
        candidates.into_iter().choose(&mut self.rng)
    }

    /// The first in-scope variable satisfying an arbitrary predicate over
    /// its type.
    pub fn find_variable(&self, predicate: impl Fn(Variable, &Type) -> bool) -> Option<Variable> {
        self.scope.visible_vars().find(|&v| predicate(v, &self.type_of(v)))
    }

    /// How many in-scope variables currently satisfy `ty` — used by the
    /// bootstrap population check ("3 per kind") without allocating.
    pub fn count_vars_of_type(&self, ty: &Type) -> usize {
        self.scope.visible_vars().filter(|&v| self.type_of(v).is(ty)).count()
    }

    fn validate_before_emit(&self, opcode: Opcode) {
        let desc = opcode.descriptor();
        let current_context = self.scope.current_context();
        if !desc.requires_context.is_empty() && !current_context.contains(desc.requires_context) {
            panic!(
                "fail-fast ILError::ContextViolation emitting {opcode:?}: requires {:?}, current context is {:?}",
                desc.requires_context, current_context
            );
        }
        if let Some(family) = desc.closes_family {
            let top_kind = self.scope.current_kind();
            let matches = match desc.requires_surrounding_block_of_kind {
                Some(expected) => top_kind == Some(expected),
                None => top_kind.map(|k| k.family()) == Some(family),
            };
            if !matches {
                panic!(
                    "fail-fast ILError::UnbalancedBlock emitting {opcode:?}: expected a surrounding block of family {family:?}, found {top_kind:?}"
                );
            }
        } else if let Some(expected) = desc.requires_surrounding_block_of_kind {
            if self.scope.current_kind() != Some(expected) {
                panic!(
                    "fail-fast ILError::WrongSurroundingBlock emitting {opcode:?}: expected {expected:?}, found {:?}",
                    self.scope.current_kind()
                );
            }
        }
    }

    /// Low-level emission with no output-type inference — the upstream
    /// compiler's hoisted-declaration path and `Opcode::CreateNamedVariable`
    /// go through this since a hoisted declaration's type isn't derivable
    /// from the opcode alone.
    pub fn emit_raw(&mut self, opcode: Opcode, inputs: Vec<Variable>, parameters: Parameters) -> Instruction {
        self.emit_with_output_type(opcode, inputs, parameters, Type::anything())
    }

    /// Typed emission: allocates fresh output/inner-output variables, infers
    /// the output type from the opcode and its resolved input types, appends
    /// the instruction, and updates the scope stack if it's a block
    /// opener/closer.
    pub fn emit(&mut self, opcode: Opcode, inputs: Vec<Variable>, parameters: Parameters) -> Instruction {
        let ty = self.infer_output_type(opcode, &inputs, &parameters);
        self.emit_with_output_type(opcode, inputs, parameters, ty)
    }

    fn emit_with_output_type(
        &mut self,
        opcode: Opcode,
        inputs: Vec<Variable>,
        parameters: Parameters,
        output_type: Type,
    ) -> Instruction {
        self.validate_before_emit(opcode);
        let desc = opcode.descriptor();

        if desc.closes_family.is_some() {
            self.scope.pop();
        }

        let outputs: Vec<Variable> = (0..desc.num_outputs).map(|_| self.alloc(output_type.clone())).collect();
        for &v in &outputs {
            self.scope.declare(v);
        }

        if let Some(kind) = desc.opens_block {
            self.scope.push(kind, desc.opens_context);
        }

        // Function/method openers declare a variadic parameter list whose
        // count only exists on the instruction (`Parameters::ArgumentCount`),
        // not on the opcode's static descriptor — `num_inner_outputs` alone
        // can't express that, so it's overridden here for exactly the
        // opcodes that pair `variadic_inputs` with a zero static count.
        use fuzzil_ir::BlockKind as BK;
        let inner_output_count = match (&parameters, desc.opens_block) {
            (
                Parameters::ArgumentCount(n),
                Some(
                    BK::PlainFunction
                    | BK::ArrowFunction
                    | BK::GeneratorFunction
                    | BK::AsyncFunction
                    | BK::AsyncGeneratorFunction
                    | BK::ClassMethod
                    | BK::WasmFunction,
                ),
            ) => *n,
            _ => desc.num_inner_outputs,
        };
        let inner_outputs: Vec<Variable> = (0..inner_output_count).map(|_| self.alloc(Type::anything())).collect();
        for &v in &inner_outputs {
            self.scope.declare(v);
        }

        let inst = Instruction::new(opcode, inputs, outputs, inner_outputs, parameters);
        self.code.push(inst.clone());
        tracing::trace!(opcode = ?inst.opcode, depth = self.scope.depth(), "emitted instruction");
        inst
    }

    /// A reusable non-recursive block-building primitive: emits the opener,
    /// runs `body`, then emits the closer. `inner_output_types` refines the
    /// types `emit` otherwise defaults inner-outputs to (e.g. a function's
    /// declared parameter types). Recursive, dispatch-driven bodies
    /// (`build_recursive`, `build_prefix`) are layered on top of this in
    /// `fuzzil-engine`, which alone has registry access.
    pub fn build_block<F>(
        &mut self,
        open_opcode: Opcode,
        open_inputs: Vec<Variable>,
        open_params: Parameters,
        inner_output_types: Vec<Type>,
        close_opcode: Opcode,
        body: F,
    ) -> Instruction
    where
        F: FnOnce(&mut ProgramBuilder, &[Variable]),
    {
        let open_inst = self.emit(open_opcode, open_inputs, open_params);
        for (&v, ty) in open_inst.inner_outputs.iter().zip(inner_output_types) {
            self.set_type(v, ty);
        }
        body(self, &open_inst.inner_outputs);
        self.emit(close_opcode, vec![], Parameters::None);
        open_inst
    }

    /// `type(of v)` inference rules: value-creating opcodes produce their
    /// obvious literal type; calls return the callee signature's return type
    /// when known; binary/unary ops narrow to numeric kinds when both
    /// operands are numeric; everything else widens to `anything` rather
    /// than guessing.
    fn infer_output_type(&self, opcode: Opcode, inputs: &[Variable], parameters: &Parameters) -> Type {
        use Opcode::*;
        match opcode {
            LoadInt => Type::integer(),
            LoadFloat => Type::float(),
            LoadBigInt => Type::bigint(),
            LoadBool => Type::boolean(),
            LoadString => Type::string(),
            LoadRegExp => Type::regexp(),
            LoadUndefined => Type::undefined(),
            LoadNull => Type::null(),
            CreateArray => Type::plain_object().iterable(),
            CreateObject => Type::plain_object(),
            CreateNamedVariable => Type::anything(),
            LoadBuiltin => match parameters {
                Parameters::BuiltinName(name) => self
                    .env
                    .builtins()
                    .iter()
                    .find(|b| b.name == *name)
                    .map(|b| b.ty.clone())
                    .unwrap_or_else(Type::anything),
                _ => Type::anything(),
            },
            GetProperty | GetElement => Type::anything(),
            CallFunction | CallMethod | Construct => inputs
                .first()
                .and_then(|&f| self.type_of(f).signature().map(|s| (*s.return_type).clone()))
                .unwrap_or_else(Type::anything),
            UnaryOperation => match parameters {
                Parameters::UnaryOp(UnaryOperator::LogicalNot) => Type::boolean(),
                _ => inputs
                    .first()
                    .map(|&v| self.type_of(v))
                    .filter(|t| t.is(&(Type::integer() | Type::float() | Type::bigint())))
                    .unwrap_or_else(Type::anything),
            },
            BinaryOperation if inputs.len() == 2 => {
                let a = self.type_of(inputs[0]);
                let b = self.type_of(inputs[1]);
                if a.is(&Type::integer()) && b.is(&Type::integer()) {
                    Type::integer()
                } else if a.is(&(Type::integer() | Type::float())) && b.is(&(Type::integer() | Type::float())) {
                    Type::float()
                } else {
                    Type::anything()
                }
            }
            CompareOperation => Type::boolean(),
            TypeOf => Type::string(),
            InstanceOf => Type::boolean(),
            Await | Yield => Type::anything(),
            BeginPlainFunction | BeginArrowFunction | BeginGeneratorFunction | BeginAsyncFunction
            | BeginAsyncGeneratorFunction => Type::function(None),
            BeginClassDefinition => Type::constructor(None),
            BeginWasmModule => Type::plain_object(),
            BeginWasmFunction => Type::function(None),
            _ => Type::anything(),
        }
    }

    // --- mutation-engine-facing surface, delegated directly onto `Code`
    // since this workspace has no independent mutation-engine crate to own
    // it ---

    pub fn replace_instruction(&mut self, index: usize, instruction: Instruction) {
        self.code.replace_instruction(index, instruction);
    }

    pub fn splice_at(&mut self, cursor: usize, fragment: &Code, offset: u32) {
        self.code.splice_at(cursor, fragment, offset);
    }

    pub fn truncate_at(&mut self, cursor: usize) {
        self.code.truncate_at(cursor);
    }

    pub fn variable_count(&self) -> u32 {
        self.var_alloc.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzil_ir::Context as Ctx;

    #[test]
    fn load_int_is_typed_integer() {
        let mut b = ProgramBuilder::new(0);
        let inst = b.emit(Opcode::LoadInt, vec![], Parameters::Int(42));
        assert!(b.type_of(inst.outputs[0]).is(&Type::integer()));
    }

    #[test]
    fn binary_add_of_two_ints_is_integer() {
        let mut b = ProgramBuilder::new(0);
        let x = b.emit(Opcode::LoadInt, vec![], Parameters::Int(1)).outputs[0];
        let y = b.emit(Opcode::LoadInt, vec![], Parameters::Int(2)).outputs[0];
        let sum = b.emit(
            Opcode::BinaryOperation,
            vec![x, y],
            Parameters::BinaryOp(fuzzil_ir::BinaryOperator::Add),
        );
        assert!(b.type_of(sum.outputs[0]).is(&Type::integer()));
    }

    #[test]
    fn function_param_leaves_scope_after_close() {
        let mut b = ProgramBuilder::new(0);
        let open = b.emit(Opcode::BeginPlainFunction, vec![], Parameters::ArgumentCount(1));
        let param = open.inner_outputs[0];
        assert!(b.rand_var_of_type(&Type::anything()).is_some());
        b.emit(Opcode::EndPlainFunction, vec![], Parameters::None);
        assert!(b.find_variable(|v, _| v == param).is_none());
    }

    #[test]
    fn context_reflects_open_blocks() {
        let mut b = ProgramBuilder::new(0);
        assert_eq!(b.context(), Ctx::JAVASCRIPT);
        let cond = b.emit(Opcode::LoadBool, vec![], Parameters::Bool(true)).outputs[0];
        b.emit(Opcode::BeginForLoop, vec![cond], Parameters::None);
        assert!(b.context().contains(Ctx::LOOP));
        b.emit(Opcode::EndForLoop, vec![], Parameters::None);
        assert!(!b.context().contains(Ctx::LOOP));
    }

    #[test]
    #[should_panic(expected = "ContextViolation")]
    fn break_outside_loop_or_switch_panics() {
        let mut b = ProgramBuilder::new(0);
        b.emit(Opcode::LoopBreak, vec![], Parameters::None);
    }

    #[test]
    fn deterministic_given_same_seed() {
        use rand::RngCore;
        let mut a = ProgramBuilder::new(99);
        let mut b = ProgramBuilder::new(99);
        for _ in 0..10 {
            assert_eq!(a.rng().next_u32(), b.rng().next_u32());
        }
    }

    #[test]
    fn build_block_scopes_inner_outputs_with_requested_types() {
        let mut b = ProgramBuilder::new(0);
        b.build_block(
            Opcode::BeginPlainFunction,
            vec![],
            Parameters::ArgumentCount(1),
            vec![Type::string()],
            Opcode::EndPlainFunction,
            |inner, params| {
                assert!(inner.type_of(params[0]).is(&Type::string()));
            },
        );
    }
}
