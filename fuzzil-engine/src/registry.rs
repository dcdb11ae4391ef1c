//! [`GeneratorRegistry`]: the immutable name → descriptor and name → weight
//! mappings the dispatch engine queries every iteration.
//!
//! Two disjoint registries exist: [`GeneratorRegistry::primary`] covers
//! everything reachable from plain JS plus the handful of opcodes that open
//! a wasm module from JS, and [`GeneratorRegistry::wasm_module`] covers the
//! generators applicable only once a `BeginWasmModule`/`BeginWasmFunction`
//! block is already open.

use crate::descriptor::GeneratorDescriptor;
use crate::generators;
use fuzzil_ir::Context;
use std::collections::HashMap;

/// Weight overrides consumed as a `name -> integer` map.
#[derive(Debug, Clone, Default)]
pub struct WeightOverrides(pub HashMap<&'static str, u32>);

impl WeightOverrides {
    pub fn new() -> Self {
        WeightOverrides(HashMap::new())
    }

    pub fn with(mut self, name: &'static str, weight: u32) -> Self {
        self.0.insert(name, weight);
        self
    }
}

/// An immutable mapping from generator name to descriptor, plus an immutable
/// mapping from name to integer weight. Built once at startup and shared by
/// reference across every builder in a worker, process-wide and read-only
/// after initialization.
pub struct GeneratorRegistry {
    descriptors: Vec<GeneratorDescriptor>,
    weights: HashMap<&'static str, u32>,
}

impl GeneratorRegistry {
    fn from_entries(entries: Vec<generators::Entry>, overrides: &WeightOverrides) -> Self {
        let mut descriptors = Vec::with_capacity(entries.len());
        let mut weights = HashMap::with_capacity(entries.len());
        for entry in entries {
            let name = entry.descriptor.name;
            weights.insert(name, *overrides.0.get(name).unwrap_or(&entry.default_weight));
            descriptors.push(entry.descriptor);
        }
        GeneratorRegistry { descriptors, weights }
    }

    /// The primary registry: JS generators plus the wasm-module/wasm-function
    /// block-openers reachable directly from JS.
    pub fn primary() -> Self {
        Self::primary_with_overrides(&WeightOverrides::default())
    }

    pub fn primary_with_overrides(overrides: &WeightOverrides) -> Self {
        Self::from_entries(generators::primary_entries(), overrides)
    }

    /// The wasm-in-module registry: generators applicable only inside an
    /// already-open `wasm` context.
    pub fn wasm_module() -> Self {
        Self::wasm_module_with_overrides(&WeightOverrides::default())
    }

    pub fn wasm_module_with_overrides(overrides: &WeightOverrides) -> Self {
        Self::from_entries(generators::wasm_module_entries(), overrides)
    }

    pub fn descriptors(&self) -> &[GeneratorDescriptor] {
        &self.descriptors
    }

    pub fn weight(&self, name: &str) -> u32 {
        self.weights.get(name).copied().unwrap_or(1)
    }

    /// Every value generator in this registry — the only ones the
    /// value-generator bootstrap is restricted to.
    pub fn value_generators(&self) -> impl Iterator<Item = &GeneratorDescriptor> {
        self.descriptors.iter().filter(|d| d.is_value_generator)
    }

    /// Generators applicable at `current_context` and satisfiable from the
    /// builder's visible variables, subject to the recursion-budget
    /// exclusion. `has_var_of_type` and `remaining_budget`/`recursion_floor`
    /// are passed in rather than a `&ProgramBuilder` so this stays a pure
    /// function of the registry over caller-supplied predicates.
    pub fn applicable<'a>(
        &'a self,
        current_context: Context,
        mut has_var_of_type: impl FnMut(&fuzzil_ir::Type) -> bool,
        remaining_budget: i64,
        recursion_floor: u32,
        allow_value_generators: bool,
    ) -> Vec<&'a GeneratorDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.required_context.is_satisfied_by(current_context))
            .filter(|d| allow_value_generators || !d.is_value_generator)
            .filter(|d| d.input_types_resolved().iter().all(|t| has_var_of_type(t)))
            .filter(|d| !d.is_recursive || remaining_budget >= recursion_floor as i64)
            .collect()
    }
}

/// Which of the two disjoint registries is active at a cursor. Primary
/// covers JS plus wasm-from-JS entry points; `WasmModule` covers generators
/// applicable only once a wasm module/function body is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Primary,
    WasmModule,
}

/// Both registries, built once per worker and handed to every
/// [`crate::GenContext`] by reference. Kept as one value so a generator
/// body can switch the active registry (entering a wasm module) without
/// needing a second process-wide singleton lookup.
pub struct Registries {
    primary: GeneratorRegistry,
    wasm_module: GeneratorRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::with_overrides(&WeightOverrides::default())
    }

    pub fn with_overrides(overrides: &WeightOverrides) -> Self {
        Registries {
            primary: GeneratorRegistry::primary_with_overrides(overrides),
            wasm_module: GeneratorRegistry::wasm_module_with_overrides(overrides),
        }
    }

    pub fn get(&self, kind: RegistryKind) -> &GeneratorRegistry {
        match kind {
            RegistryKind::Primary => &self.primary,
            RegistryKind::WasmModule => &self.wasm_module,
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_registry_is_non_empty() {
        let reg = GeneratorRegistry::primary();
        assert!(reg.descriptors().len() > 10);
    }

    #[test]
    fn weight_override_takes_precedence() {
        let overrides = WeightOverrides::new().with("IntegerGenerator", 999);
        let reg = GeneratorRegistry::primary_with_overrides(&overrides);
        assert_eq!(reg.weight("IntegerGenerator"), 999);
    }

    #[test]
    fn unknown_generator_name_has_default_weight_one() {
        let reg = GeneratorRegistry::primary();
        assert_eq!(reg.weight("NotARealGenerator"), 1);
    }

    #[test]
    fn wasm_module_registry_requires_wasm_context() {
        let reg = GeneratorRegistry::wasm_module();
        assert!(reg.descriptors().iter().all(|d| d.required_context.contains(Context::WASM)));
    }
}
