//! The weighted dispatch engine: the instruction-budget loop behind
//! `build(n)`, the value-generator bootstrap behind `build_prefix`, and
//! `generate_variable`. [`crate::gen_context::GenContext`]'s `build`/
//! `build_prefix`/`generate_variable` are thin forwarders onto the free
//! functions here, which is where the actual applicable-set computation,
//! cumulative-weight selection, and input resolution happen.

use crate::descriptor::GeneratorDescriptor;
use crate::gen_context::GenContext;
use crate::registry::{GeneratorRegistry, RegistryKind};
use fuzzil_ir::{Opcode, Parameters, Type, Variable};
use rand::Rng;

/// The applicable-set computation: every descriptor in the active registry
/// whose `requiredContext` holds at the cursor and whose declared input
/// types can all be satisfied from the builder's visible variables, subject
/// to the recursion-budget exclusion. Takes `&GenContext` (not `&mut`) since
/// every predicate here only reads builder state; `resolve_inputs` is the
/// step that needs `&mut` to sample.
fn applicable_generators(ctx: &GenContext, allow_value_generators: bool) -> Vec<GeneratorDescriptor> {
    let context = ctx.builder.context();
    let remaining = ctx.current_remaining();
    let recursion_floor = ctx.config().recursion_floor;
    ctx.registry()
        .applicable(
            context,
            |ty| ctx.builder.count_vars_of_type(ty) > 0,
            remaining,
            recursion_floor,
            allow_value_generators,
        )
        .into_iter()
        .copied()
        .collect()
}

/// Cumulative-weight selection. The applicable sets here are typically a
/// few dozen entries at most, so a linear scan over the cumulative weights
/// fits better than a binary-search-over-prefix-sums approach would.
fn weighted_pick(rng: &mut impl Rng, descriptors: &[GeneratorDescriptor], registry: &GeneratorRegistry) -> GeneratorDescriptor {
    let total: u32 = descriptors.iter().map(|d| registry.weight(d.name)).sum();
    if total == 0 {
        return descriptors[0];
    }
    let mut pick = rng.random_range(0..total);
    for d in descriptors {
        let w = registry.weight(d.name);
        if pick < w {
            return *d;
        }
        pick -= w;
    }
    *descriptors.last().expect("descriptors is never empty here")
}

/// For each declared input type, picks a visible variable of that type
/// uniformly at random from candidates. Returns `None` on the first
/// unsatisfiable input type — the generator-level self-abort path, even
/// though `applicable_generators` already filtered on "can produce one",
/// since a single shared variable might be the only candidate for two
/// different declared input types and get consumed by the first pick.
fn resolve_inputs(ctx: &mut GenContext, descriptor: &GeneratorDescriptor) -> Option<Vec<Variable>> {
    let mut inputs = Vec::with_capacity(descriptor.input_types.len());
    for ty in descriptor.input_types_resolved() {
        match ctx.builder.rand_var_of_type(&ty) {
            Some(v) => inputs.push(v),
            None => return None,
        }
    }
    Some(inputs)
}

/// `build(n)`: emits roughly `n` instructions at the current cursor.
///
/// The "close the innermost block and retry" fallback is unreachable in this
/// registry: every value generator declares `requiredContext = javascript`,
/// and the root frame always contributes the `JAVASCRIPT` bit, so the
/// applicable set with value generators allowed is never empty. The branch
/// is kept as a defensive backstop rather than relied upon.
pub fn build(ctx: &mut GenContext, n: u32) {
    let overshoot_cap = ((n as f64) * ctx.config().build_overshoot_factor).ceil().max(1.0) as i64;
    let mut remaining: i64 = n as i64;
    let mut total_emitted: i64 = 0;
    ctx.set_current_remaining(remaining);

    while remaining > 0 && total_emitted < overshoot_cap {
        let applicable = applicable_generators(ctx, true);
        let descriptor = match applicable.first() {
            Some(_) => weighted_pick(ctx.builder.rng(), &applicable, ctx.registry()),
            None => {
                tracing::warn!(depth = ctx.builder.scope_depth(), "no applicable generator at cursor, including value generators; stopping build early");
                break;
            }
        };

        let Some(inputs) = resolve_inputs(ctx, &descriptor) else {
            tracing::trace!(generator = descriptor.name, "self-abort: no candidate input variable");
            continue;
        };

        let before = ctx.builder.code().len();
        (descriptor.body)(ctx, &inputs);
        let after = ctx.builder.code().len();
        let delta = after.saturating_sub(before) as i64;
        total_emitted += delta;
        remaining -= delta;
        ctx.set_current_remaining(remaining.max(0));
        if delta == 0 {
            tracing::trace!(generator = descriptor.name, "self-abort: emitted zero instructions");
        }
    }
}

/// The kinds `build_prefix` aims to populate, per active registry. The
/// primary registry's value generators produce the six JS primitive/object
/// kinds; the wasm-in-module registry's only value generator
/// (`WasmNumericConstGenerator`) produces the four wasm numeric atoms, which
/// are disjoint from all six JS kinds — tracking the JS kinds inside a wasm
/// function body would never converge and would run the bootstrap to its
/// round cap on every wasm function.
fn tracked_kinds(registry_kind: RegistryKind) -> Vec<Type> {
    match registry_kind {
        RegistryKind::Primary => vec![
            Type::integer(),
            Type::float(),
            Type::bigint(),
            Type::boolean(),
            Type::string(),
            Type::plain_object(),
        ],
        RegistryKind::WasmModule => vec![Type::wasm_i32(), Type::wasm_i64(), Type::wasm_f32(), Type::wasm_f64()],
    }
}

/// The value-generator bootstrap: selects value generators until a minimum
/// population of typed variables exists — "3 values per kind" by default.
/// Run once before every template body and once more inside every newly
/// opened function/wasm-function body via `build_prefix`.
pub fn build_prefix(ctx: &mut GenContext) {
    let target = ctx.config().bootstrap_population_target;
    let tracked_kinds = tracked_kinds(ctx.active_registry_kind());
    // Each round can only ever close one kind's deficit by one, so the
    // generous cap here just bounds a pathological registry (every value
    // generator's body self-aborting) rather than the expected case.
    let max_rounds = tracked_kinds.len() * target * 20;

    for _ in 0..max_rounds {
        if tracked_kinds.iter().all(|k| ctx.builder.count_vars_of_type(k) >= target) {
            break;
        }
        let value_generators: Vec<GeneratorDescriptor> = applicable_generators(ctx, true)
            .into_iter()
            .filter(|d| d.is_value_generator)
            .collect();
        let Some(_) = value_generators.first() else { break };
        let descriptor = weighted_pick(ctx.builder.rng(), &value_generators, ctx.registry());
        (descriptor.body)(ctx, &[]);
    }
}

/// Resolves a variable of type `T`: reuse an existing in-scope match, else
/// synthesize one via a value generator declaring a matching `produces`
/// type, else fall back to `LoadUndefined`.
pub fn generate_variable(ctx: &mut GenContext, ty: &Type) -> Variable {
    if let Some(v) = ctx.builder.rand_var_of_type(ty) {
        return v;
    }

    let candidates: Vec<GeneratorDescriptor> = ctx
        .registry()
        .value_generators()
        .filter(|d| d.produces_resolved().map(|ps| ps.iter().any(|p| p.is(ty))).unwrap_or(false))
        .copied()
        .collect();

    if let Some(_) = candidates.first() {
        let descriptor = weighted_pick(ctx.builder.rng(), &candidates, ctx.registry());
        (descriptor.body)(ctx, &[]);
        if let Some(v) = ctx.builder.rand_var_of_type(ty) {
            return v;
        }
    }

    ctx.builder.emit(Opcode::LoadUndefined, vec![], Parameters::None).outputs[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::registry::Registries;
    use fuzzil_builder::ProgramBuilder;
    use fuzzil_env::TypeExt;

    fn fresh<'a>(builder: &'a mut ProgramBuilder, registries: &'a Registries, config: &'a EngineConfig) -> GenContext<'a> {
        GenContext::new(builder, registries, config)
    }

    #[test]
    fn bootstrap_liveness_build_one_emits_at_least_one_instruction() {
        // build(1) from an empty variable set in a plain javascript context
        // always emits at least one instruction.
        let mut builder = ProgramBuilder::new(1);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = fresh(&mut builder, &registries, &config);
        build(&mut ctx, 1);
        assert!(!ctx.builder.code().is_empty());
    }

    #[test]
    fn build_prefix_reaches_bootstrap_population_target_for_integers() {
        // "3 values per kind" by default, generalized to whatever
        // EngineConfig::bootstrap_population_target is set to.
        let mut builder = ProgramBuilder::new(5);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = fresh(&mut builder, &registries, &config);
        build_prefix(&mut ctx);
        assert!(ctx.builder.count_vars_of_type(&Type::integer()) >= config.bootstrap_population_target);
    }

    #[test]
    fn build_never_leaves_dangling_open_blocks() {
        let mut builder = ProgramBuilder::new(9);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = fresh(&mut builder, &registries, &config);
        build_prefix(&mut ctx);
        build(&mut ctx, 60);
        assert!(ctx.builder.code().check().is_ok());
    }

    #[test]
    fn generate_variable_falls_back_to_load_undefined_for_unsatisfiable_type() {
        let mut builder = ProgramBuilder::new(2);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = fresh(&mut builder, &registries, &config);
        // FUNCTION and CONSTRUCTOR are disjoint base bits, so intersecting
        // them yields the empty (bottom) type, which no value generator can
        // ever produce and which matches no existing variable either -- this
        // always falls through to the LoadUndefined fallback.
        let impossible = Type::function(None).intersect(&Type::constructor(None));
        let v = generate_variable(&mut ctx, &impossible);
        assert!(ctx.builder.code().iter().any(|i| i.opcode == Opcode::LoadUndefined && i.outputs.first() == Some(&v)));
    }

    #[test]
    fn deterministic_given_same_seed_and_registry() {
        let registries = Registries::new();
        let config = EngineConfig::default();

        let mut builder_a = ProgramBuilder::new(77);
        let mut ctx_a = fresh(&mut builder_a, &registries, &config);
        build_prefix(&mut ctx_a);
        build(&mut ctx_a, 40);

        let mut builder_b = ProgramBuilder::new(77);
        let mut ctx_b = fresh(&mut builder_b, &registries, &config);
        build_prefix(&mut ctx_b);
        build(&mut ctx_b, 40);

        assert_eq!(builder_a.code(), builder_b.code());
    }

    #[test]
    fn build_prefix_is_bounded_inside_a_wasm_function_body() {
        // Inside a wasm function the active registry's only value generator
        // produces wasm numeric atoms, not the six JS kinds -- build_prefix
        // must track the wasm kinds here or the JS-kind deficit never
        // closes and the loop runs to its full (and far larger) round cap.
        let mut builder = ProgramBuilder::new(123);
        let registries = Registries::new();
        let config = EngineConfig::default();
        let mut ctx = fresh(&mut builder, &registries, &config);
        ctx.builder.emit(Opcode::BeginWasmModule, vec![], Parameters::None);
        ctx.builder.emit(Opcode::BeginWasmFunction, vec![], Parameters::ArgumentCount(0));
        let before = ctx.builder.code().len();

        ctx.with_wasm_module_registry(|ctx| build_prefix(ctx));

        let emitted = ctx.builder.code().len() - before;
        assert!(emitted < 100, "build_prefix emitted {emitted} instructions inside a wasm function body");
        for kind in [Type::wasm_i32(), Type::wasm_i64(), Type::wasm_f32(), Type::wasm_f64()] {
            assert!(ctx.builder.count_vars_of_type(&kind) >= config.bootstrap_population_target);
        }
    }
}
