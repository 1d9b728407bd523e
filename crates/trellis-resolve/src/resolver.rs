//! The phased resolution algorithm.

use std::sync::Arc;

use trellis_bindings::QualifierSet;
use trellis_core::{DeploymentError, Problems, ResolutionError};
use trellis_registry::{Bean, BeanId, BeanKind, DeploymentContext, Resolution, ResolutionKey};
use trellis_types::bean_rules;

/// Resolve a request against the deployment, memoized per key.
pub fn resolve(
    ctx: &DeploymentContext,
    key: &ResolutionKey,
) -> Result<Arc<Resolution>, ResolutionError> {
    ctx.bean_resolution(key, || resolve_uncached(ctx, key))
}

/// Boot-time wrapper for required injection points: unsatisfied and
/// ambiguous outcomes become deployment errors in `problems`.
pub fn resolve_required(
    ctx: &DeploymentContext,
    key: &ResolutionKey,
    injection_point: &str,
    problems: &mut Problems,
) -> Option<BeanId> {
    let resolution = match resolve(ctx, key) {
        Ok(resolution) => resolution,
        Err(ResolutionError::ContextDisposed) => {
            // Validation against a disposed context is a container bug.
            panic!("required injection point validated after context disposal");
        }
        Err(_) => unreachable!("resolve only fails on disposal"),
    };
    match &*resolution {
        Resolution::Resolved(id) => Some(*id),
        Resolution::Unsatisfied => {
            problems.push_deployment(DeploymentError::UnsatisfiedDependency {
                injection_point: injection_point.to_string(),
            });
            None
        }
        Resolution::Ambiguous(candidates) => {
            problems.push_deployment(DeploymentError::AmbiguousDependency {
                injection_point: injection_point.to_string(),
                candidates: candidates
                    .iter()
                    .map(|id| ctx.closure().bean(*id).label(ctx.types()))
                    .collect(),
            });
            None
        }
    }
}

fn resolve_uncached(ctx: &DeploymentContext, key: &ResolutionKey) -> Resolution {
    let env = ctx.types();
    let closure = ctx.closure();

    // Phase 1+2: gather candidates by raw type, then filter by the matching
    // rules and qualifier equivalence.
    let gathered = closure.candidates_for(env, &key.required);
    let mut matched: Vec<BeanId> = gathered
        .into_iter()
        .filter(|id| {
            let bean = closure.bean(*id);
            bean.kind != BeanKind::Interceptor
                && bean_rules::matches_any(env, &key.required, &bean.types)
                && contains_all_qualifiers(&key.qualifiers, &bean.qualifiers)
        })
        .collect();

    // Phase 3: drop disabled alternatives.
    matched.retain(|id| closure.enablement().is_enabled(closure.bean(*id)));

    // Phase 4: specialization suppression, only against co-candidates.
    let snapshot = matched.clone();
    matched.retain(|id| !closure.is_suppressed(*id, &snapshot));

    tracing::trace!(candidates = matched.len(), "resolution candidates after filtering");

    // Phase 5: decision, with alternative disambiguation.
    decide(ctx, matched)
}

/// The request's qualifiers must each have an equivalent on the bean. `@Any`
/// needs no special case: normalization puts it on every bean.
fn contains_all_qualifiers(requested: &QualifierSet, bean: &QualifierSet) -> bool {
    requested.is_subset(bean)
}

fn decide(ctx: &DeploymentContext, matched: Vec<BeanId>) -> Resolution {
    if matched.len() <= 1 {
        return Resolution::from_candidates(matched);
    }

    let closure = ctx.closure();
    let alternatives: Vec<BeanId> = matched
        .iter()
        .copied()
        .filter(|id| closure.bean(*id).alternative)
        .collect();

    if alternatives.is_empty() {
        return Resolution::from_candidates(matched);
    }
    if alternatives.len() == 1 {
        return Resolution::Resolved(alternatives[0]);
    }
    resolve_alternatives(ctx, alternatives)
}

/// When all remaining candidates are alternatives with a priority, the
/// highest priority wins. Any alternative without a priority, or a tie at
/// the top, leaves the dependency ambiguous.
fn resolve_alternatives(ctx: &DeploymentContext, alternatives: Vec<BeanId>) -> Resolution {
    let closure = ctx.closure();
    let enablement = closure.enablement();

    let mut highest = i32::MIN;
    let mut selected: Vec<BeanId> = Vec::new();
    for id in &alternatives {
        let Some(priority) = enablement.alternative_priority(closure.bean(*id)) else {
            return Resolution::from_candidates(alternatives);
        };
        if priority > highest {
            highest = priority;
            selected.clear();
        }
        if priority == highest {
            selected.push(*id);
        }
    }
    Resolution::from_candidates(selected)
}

/// Shared tail for the name-based resolver: enablement, specialization
/// suppression, and the decision.
pub(crate) fn filter_and_decide(ctx: &DeploymentContext, candidates: &[BeanId]) -> Resolution {
    let closure = ctx.closure();
    let mut matched: Vec<BeanId> = candidates
        .iter()
        .copied()
        .filter(|id| closure.enablement().is_enabled(closure.bean(*id)))
        .collect();
    let snapshot = matched.clone();
    matched.retain(|id| !closure.is_suppressed(*id, &snapshot));
    decide(ctx, matched)
}

pub(crate) fn bean_label(ctx: &DeploymentContext, id: BeanId) -> String {
    let bean: &Bean = ctx.closure().bean(id);
    bean.label(ctx.types())
}
