//! Merging class-level and inherited interceptor bindings.

use std::collections::{BTreeMap, BTreeSet};

use trellis_core::{DefinitionError, DeploymentError};

use crate::annotations::{AnnotationTypeId, RawAnnotation};
use crate::models::BindingStore;
use crate::qualifier::QualifierInstance;

/// The merged binding map handed to interceptor resolution: every binding
/// type present on the bean, with the instances that apply. Non-repeatable
/// types carry exactly one instance.
pub type MergedBindings = BTreeMap<AnnotationTypeId, Vec<RawAnnotation>>;

/// A non-equivalent duplicate of one binding type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConflict {
    pub binding: AnnotationTypeId,
    /// True when the conflict is between two *inherited* sources; false for
    /// a conflict among class-level declarations. The caller maps the former
    /// to a deployment error and the latter to a definition error.
    pub inherited: bool,
}

/// Merge class-level interceptor bindings with bindings inherited from
/// stereotypes and meta-annotations.
///
/// Class-level bindings take precedence: an inherited binding of a type
/// already declared on the class is dropped without an equivalence check.
/// Two class-level bindings, or two inherited bindings from different
/// sources, that disagree on binding members are a conflict. Repeatable
/// binding types skip conflict detection and accumulate.
pub fn merge_interceptor_bindings(
    store: &BindingStore,
    class_level: &[RawAnnotation],
    inherited: &[RawAnnotation],
) -> Result<MergedBindings, BindingConflict> {
    let mut merged = MergedBindings::new();
    let mut from_class: BTreeSet<AnnotationTypeId> = BTreeSet::new();

    for binding in class_level {
        if is_repeatable(store, binding.decl) {
            merged.entry(binding.decl).or_default().push(binding.clone());
            from_class.insert(binding.decl);
            continue;
        }
        if let Some(existing) = merged.get(&binding.decl).and_then(|v| v.first()) {
            if !equivalent(store, existing, binding) {
                return Err(BindingConflict {
                    binding: binding.decl,
                    inherited: false,
                });
            }
            continue;
        }
        merged.insert(binding.decl, vec![binding.clone()]);
        from_class.insert(binding.decl);
    }

    let mut accepted_inherited: BTreeMap<AnnotationTypeId, RawAnnotation> = BTreeMap::new();
    for binding in inherited {
        if is_repeatable(store, binding.decl) {
            merged.entry(binding.decl).or_default().push(binding.clone());
            continue;
        }
        if from_class.contains(&binding.decl) {
            // Class-level declarations shadow inherited ones of the same
            // type silently, equivalence unchecked.
            continue;
        }
        match accepted_inherited.get(&binding.decl) {
            None => {
                accepted_inherited.insert(binding.decl, binding.clone());
                merged.insert(binding.decl, vec![binding.clone()]);
            }
            Some(previous) => {
                if !equivalent(store, previous, binding) {
                    return Err(BindingConflict {
                        binding: binding.decl,
                        inherited: true,
                    });
                }
            }
        }
    }

    Ok(merged)
}

fn is_repeatable(store: &BindingStore, id: AnnotationTypeId) -> bool {
    store
        .annotations()
        .decl(id)
        .map_or(false, |decl| decl.repeatable)
}

/// Binding-member equivalence between two instances of the same type. A
/// model or value failure counts as non-equivalent; the caller reports the
/// conflict and the definition error surfaces separately when the binding
/// itself is processed.
fn equivalent(store: &BindingStore, a: &RawAnnotation, b: &RawAnnotation) -> bool {
    match (
        QualifierInstance::of(a, store),
        QualifierInstance::of(b, store),
    ) {
        (Ok(a), Ok(b)) => a == b,
        (Err(_), _) | (_, Err(_)) => false,
    }
}

impl BindingConflict {
    /// Render this conflict against the error taxonomy. Inherited conflicts
    /// are deployment errors; class-level conflicts are definition errors.
    /// The caller picks the channel via [`BindingConflict::inherited`].
    pub fn to_definition_error(&self, store: &BindingStore, class: &str) -> DefinitionError {
        DefinitionError::ConflictingInterceptorBindings {
            class: class.to_string(),
            binding: store.annotations().name_of(self.binding).to_string(),
        }
    }

    pub fn to_deployment_error(&self, store: &BindingStore, class: &str) -> DeploymentError {
        DeploymentError::ConflictingInheritedBindings {
            class: class.to_string(),
            binding: store.annotations().name_of(self.binding).to_string(),
        }
    }
}
