//! Every built-in generator, grouped by the JS/wasm surface it covers. Each
//! submodule exposes an `ENTRIES` table pairing a [`GeneratorDescriptor`]
//! with its default weight; [`primary_entries`] and [`wasm_module_entries`]
//! concatenate the tables that belong to each of the two disjoint
//! registries.

use crate::descriptor::GeneratorDescriptor;

pub mod control_flow;
pub mod effectful;
pub mod functions;
pub mod type_fns;
pub mod value;
pub mod wasm;

/// One row of a generator table: a descriptor paired with the weight it
/// carries before any [`crate::registry::WeightOverrides`] are applied.
pub struct Entry {
    pub descriptor: GeneratorDescriptor,
    pub default_weight: u32,
}

fn entries_from(table: &[(GeneratorDescriptor, u32)]) -> Vec<Entry> {
    table
        .iter()
        .map(|(descriptor, weight)| Entry {
            descriptor: *descriptor,
            default_weight: *weight,
        })
        .collect()
}

/// Every generator reachable from plain JS, plus `BeginWasmModule` (the one
/// door into the wasm-in-module registry).
pub fn primary_entries() -> Vec<Entry> {
    let mut entries = Vec::new();
    entries.extend(entries_from(value::ENTRIES));
    entries.extend(entries_from(effectful::ENTRIES));
    entries.extend(entries_from(control_flow::ENTRIES));
    entries.extend(entries_from(functions::ENTRIES));
    entries
}

/// Every generator applicable only once a wasm module/function body is open.
pub fn wasm_module_entries() -> Vec<Entry> {
    entries_from(wasm::ENTRIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_entries_are_never_wasm_only() {
        for entry in primary_entries() {
            assert!(!entry.descriptor.required_context.contains(fuzzil_ir::Context::WASM_TYPE_GROUP));
        }
    }

    #[test]
    fn wasm_module_entries_all_require_wasm_context() {
        for entry in wasm_module_entries() {
            assert!(entry.descriptor.required_context.contains(fuzzil_ir::Context::WASM));
        }
    }

    #[test]
    fn no_duplicate_generator_names_within_a_registry() {
        let mut names: Vec<&str> = primary_entries().iter().map(|e| e.descriptor.name).collect();
        names.sort_unstable();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }
}
