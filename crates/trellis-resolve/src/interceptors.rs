//! Interceptor resolution by binding subset.

use std::sync::Arc;

use thiserror::Error;

use trellis_bindings::{QualifierInstance, QualifierSet, RawAnnotation};
use trellis_core::{DefinitionError, ResolutionError};
use trellis_registry::{BeanId, BeanKind, DeploymentContext, InterceptionKind, InterceptorKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptorResolutionError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Resolve the ordered interceptor chain for one interception kind and a set
/// of merged bindings.
///
/// An interceptor applies when it implements the interception kind and every
/// one of its declared bindings has an equivalent (binding members only) in
/// the request set. Only interceptors carrying a priority are enabled; the
/// chain is ordered by ascending priority, registration order breaking ties.
pub fn resolve_interceptors(
    ctx: &DeploymentContext,
    kind: InterceptionKind,
    bindings: &[RawAnnotation],
) -> Result<Arc<Vec<BeanId>>, InterceptorResolutionError> {
    if bindings.is_empty() {
        return Err(DefinitionError::EmptyInterceptorBindings.into());
    }

    let mut requested = QualifierSet::new();
    for binding in bindings {
        requested.insert(QualifierInstance::of(binding, ctx.bindings())?);
    }

    let key = InterceptorKey {
        kind,
        bindings: requested.clone(),
    };
    let chain = ctx.interceptor_resolution(&key, || {
        let closure = ctx.closure();
        let mut chain: Vec<(i32, BeanId)> = closure
            .beans()
            .filter(|(_, bean)| bean.kind == BeanKind::Interceptor)
            .filter(|(_, bean)| bean.intercepts.contains(&kind))
            .filter_map(|(id, bean)| bean.priority.map(|priority| (priority, id, bean)))
            .filter(|(_, _, bean)| {
                bean.interceptor_bindings.values().flatten().all(|declared| {
                    match QualifierInstance::of(declared, ctx.bindings()) {
                        Ok(instance) => requested.contains(&instance),
                        Err(_) => false,
                    }
                })
            })
            .map(|(priority, id, _)| (priority, id))
            .collect();
        chain.sort_unstable();
        chain.into_iter().map(|(_, id)| id).collect()
    })?;
    Ok(chain)
}
