//! [`GenContext`]: the mutable handle threaded through one `build` call and
//! every generator body it invokes — the builder and the dispatch engine
//! hold borrowed references to each other's state. Rather than a cyclic
//! dependency between crates, the cycle lives inside this single struct:
//! `fuzzil-builder` knows nothing of it, and `fuzzil-engine` threads one
//! `&mut GenContext` through the whole call chain instead of constructing a
//! fresh one per recursion level.

use crate::config::EngineConfig;
use crate::registry::{GeneratorRegistry, RegistryKind, Registries};
use fuzzil_builder::ProgramBuilder;
use fuzzil_ir::{Type, Variable};

/// Borrowed for the duration of one top-level `build`/`buildPrefix` call.
/// Generator bodies receive `&mut GenContext` and call back into
/// [`GenContext::build`]/[`GenContext::build_recursive`] for their sub-block
/// contents rather than touching the dispatch loop directly.
pub struct GenContext<'a> {
    pub builder: &'a mut ProgramBuilder,
    registries: &'a Registries,
    active: RegistryKind,
    config: &'a EngineConfig,
    recursion_depth: u32,
    current_remaining: i64,
}

impl<'a> GenContext<'a> {
    pub fn new(builder: &'a mut ProgramBuilder, registries: &'a Registries, config: &'a EngineConfig) -> Self {
        GenContext {
            builder,
            registries,
            active: RegistryKind::Primary,
            config,
            recursion_depth: 0,
            current_remaining: 0,
        }
    }

    /// The registry currently governing dispatch — the primary registry
    /// everywhere except inside an open wasm module/function body.
    pub fn registry(&self) -> &'a GeneratorRegistry {
        self.registries.get(self.active)
    }

    pub fn active_registry_kind(&self) -> RegistryKind {
        self.active
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn recursion_depth(&self) -> u32 {
        self.recursion_depth
    }

    /// Instructions remaining in the `build(n)` call this generator body was
    /// invoked from — a generator picking `m` for `build_recursive` reads
    /// this rather than guessing.
    pub fn current_remaining(&self) -> i64 {
        self.current_remaining
    }

    pub(crate) fn set_current_remaining(&mut self, remaining: i64) {
        self.current_remaining = remaining;
    }

    /// Emits roughly `n` instructions at the current cursor.
    pub fn build(&mut self, n: u32) {
        crate::dispatch::build(self, n);
    }

    /// The value-generator bootstrap run at the start of every template and
    /// every newly opened function body.
    pub fn build_prefix(&mut self) {
        crate::dispatch::build_prefix(self);
    }

    /// Resolves (or synthesizes) a variable of type `T`.
    pub fn generate_variable(&mut self, ty: &Type) -> Variable {
        crate::dispatch::generate_variable(self, ty)
    }

    /// Recurses into a fresh `build` call sized to roughly `total_m / of_n`
    /// instructions, subject to `EngineConfig::max_recursion_depth`. `block_k`
    /// identifies which of the `of_n` sibling sub-blocks this is — purely
    /// informational in this implementation (every sub-block gets an equal
    /// share), kept so generator bodies can log or weight it later.
    pub fn build_recursive(&mut self, block_k: u32, of_n: u32, total_m: u32) {
        let _ = block_k;
        if self.recursion_depth >= self.config.max_recursion_depth {
            tracing::debug!(depth = self.recursion_depth, "recursion floor reached, self-aborting sub-block");
            return;
        }
        let quota = if of_n == 0 { 0 } else { total_m / of_n };
        self.recursion_depth += 1;
        self.build(quota);
        self.recursion_depth -= 1;
    }

    /// Switches dispatch onto the wasm-in-module registry for the duration of
    /// `f`, then restores whatever was active before — there are two
    /// disjoint registries, the primary one and the wasm-in-module one. Used
    /// by the wasm-module generator to hand its body off to wasm-only
    /// generators, and nested wasm block/function generators reuse it
    /// defensively even though it's already active.
    pub fn with_wasm_module_registry<R>(&mut self, f: impl FnOnce(&mut GenContext) -> R) -> R {
        let previous = self.active;
        self.active = RegistryKind::WasmModule;
        let result = f(self);
        self.active = previous;
        result
    }
}
