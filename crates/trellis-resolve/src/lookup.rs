//! `Instance<T>`-style dynamic lookup.

use trellis_bindings::{BindingStore, QualifierInstance, RawAnnotation};
use trellis_core::{DefinitionError, ResolutionError};
use trellis_registry::{BeanId, DeploymentContext, Resolution, ResolutionKey};
use trellis_types::Type;

/// A programmatic lookup handle. Unlike required injection points, faults
/// here are raised immediately at the call site as typed errors, never
/// deferred to a validation report.
#[derive(Debug, Clone)]
pub struct DynamicLookup<'a> {
    ctx: &'a DeploymentContext,
    key: ResolutionKey,
}

impl<'a> DynamicLookup<'a> {
    pub fn new(ctx: &'a DeploymentContext, key: ResolutionKey) -> Self {
        Self { ctx, key }
    }

    /// Refine the lookup with an additional qualifier.
    pub fn select(
        &self,
        qualifier: &RawAnnotation,
        bindings: &BindingStore,
    ) -> Result<Self, DefinitionError> {
        let mut key = self.key.clone();
        key.qualifiers.insert(QualifierInstance::of(qualifier, bindings)?);
        Ok(Self { ctx: self.ctx, key })
    }

    /// Refine the lookup to a subtype of the current required type.
    pub fn select_type(&self, required: Type) -> Self {
        let mut key = self.key.clone();
        key.required = required;
        Self { ctx: self.ctx, key }
    }

    pub fn get(&self) -> Result<BeanId, ResolutionError> {
        let resolution = crate::resolver::resolve(self.ctx, &self.key)?;
        match &*resolution {
            Resolution::Resolved(id) => Ok(*id),
            Resolution::Unsatisfied => Err(ResolutionError::Unsatisfied),
            Resolution::Ambiguous(candidates) => Err(ResolutionError::Ambiguous {
                candidates: candidates
                    .iter()
                    .map(|id| crate::resolver::bean_label(self.ctx, *id))
                    .collect(),
            }),
        }
    }

    pub fn is_unsatisfied(&self) -> Result<bool, ResolutionError> {
        Ok(matches!(
            &*crate::resolver::resolve(self.ctx, &self.key)?,
            Resolution::Unsatisfied
        ))
    }

    pub fn is_ambiguous(&self) -> Result<bool, ResolutionError> {
        Ok(matches!(
            &*crate::resolver::resolve(self.ctx, &self.key)?,
            Resolution::Ambiguous(_)
        ))
    }
}
