//! Observer resolution: which observers receive an event.

use std::sync::Arc;

use trellis_bindings::QualifierSet;
use trellis_core::ResolutionError;
use trellis_registry::{DeploymentContext, ObserverId, ResolutionKey};
use trellis_types::{event_rules, type_closure, Type};

/// Find every observer whose observed type matches the event's type closure
/// (covariant event rules) and whose declared qualifiers are all among the
/// event's qualifiers. An observer with no qualifiers receives every
/// matching event.
///
/// Results are memoized per (event type, qualifier set) and returned in
/// registration order.
pub fn resolve_observers(
    ctx: &DeploymentContext,
    event_type: &Type,
    event_qualifiers: &QualifierSet,
) -> Result<Arc<Vec<ObserverId>>, ResolutionError> {
    let key = ResolutionKey {
        required: event_type.clone(),
        qualifiers: event_qualifiers.clone(),
    };
    ctx.observer_resolution(&key, || {
        let env = ctx.types();
        let event_types = type_closure(env, event_type);
        ctx.closure()
            .observers()
            .filter(|(_, observer)| {
                event_rules::matches_any(env, &observer.observed_type, &event_types)
                    && observer.qualifiers.is_subset(event_qualifiers)
            })
            .map(|(id, _)| id)
            .collect()
    })
}
