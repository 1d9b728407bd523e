//! EL-name resolution.

use std::sync::Arc;

use trellis_core::ResolutionError;
use trellis_registry::{DeploymentContext, Resolution};

/// Resolve a bean by its EL name, memoized per name.
///
/// Names share the resolver's tail: disabled alternatives drop out, a
/// specialized bean yields to its specializer, and several enabled beans
/// with the same name stay ambiguous.
pub fn resolve_name(
    ctx: &DeploymentContext,
    name: &str,
) -> Result<Arc<Resolution>, ResolutionError> {
    ctx.name_resolution(name, || {
        let candidates = ctx.closure().beans_named(name).to_vec();
        crate::resolver::filter_and_decide(ctx, &candidates)
    })
}
