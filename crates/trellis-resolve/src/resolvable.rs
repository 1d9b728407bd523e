//! Building resolution requests from injection-point metadata.

use std::collections::BTreeMap;

use trellis_bindings::{BindingStore, QualifierInstance, QualifierSet, RawAnnotation};
use trellis_core::DefinitionError;
use trellis_registry::ResolutionKey;
use trellis_types::{display, Type, TypeEnv};

/// Normalizes an injection point's required type and qualifiers into a
/// [`ResolutionKey`].
///
/// A request with no qualifiers gets `@Default`; `@Any` stays implicit on
/// the request side because every bean carries it. Duplicate non-repeatable
/// qualifiers and illegal required types are definition errors against the
/// injection point.
pub struct ResolvableBuilder {
    required: Type,
    injection_point: String,
    qualifiers: Vec<RawAnnotation>,
}

impl ResolvableBuilder {
    pub fn new(required: Type) -> Self {
        Self {
            required,
            injection_point: "<unknown injection point>".to_string(),
            qualifiers: Vec::new(),
        }
    }

    /// Label used in diagnostics, e.g. `com.acme.Checkout#paymentService`.
    pub fn at(mut self, injection_point: &str) -> Self {
        self.injection_point = injection_point.to_string();
        self
    }

    pub fn qualifier(mut self, qualifier: RawAnnotation) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn qualifiers(mut self, qualifiers: impl IntoIterator<Item = RawAnnotation>) -> Self {
        self.qualifiers.extend(qualifiers);
        self
    }

    pub fn build(
        self,
        env: &dyn TypeEnv,
        bindings: &BindingStore,
    ) -> Result<ResolutionKey, DefinitionError> {
        if matches!(self.required, Type::TypeVar(_) | Type::Wildcard(_)) {
            return Err(DefinitionError::IllegalRequiredType {
                injection_point: self.injection_point,
                ty: display(env, &self.required),
            });
        }

        let mut instances = QualifierSet::new();
        let mut seen: BTreeMap<_, QualifierInstance> = BTreeMap::new();
        for raw in &self.qualifiers {
            let instance = QualifierInstance::of(raw, bindings)?;
            let repeatable = bindings
                .annotations()
                .decl(raw.decl)
                .map_or(false, |decl| decl.repeatable);
            if !repeatable {
                if let Some(previous) = seen.get(&raw.decl) {
                    if *previous != instance {
                        return Err(DefinitionError::DuplicateQualifiers {
                            injection_point: self.injection_point,
                            qualifier: bindings.annotations().name_of(raw.decl).to_string(),
                        });
                    }
                }
                seen.insert(raw.decl, instance.clone());
            }
            instances.insert(instance);
        }

        if instances.is_empty() {
            instances.insert(QualifierInstance::default_qualifier());
        }

        Ok(ResolutionKey {
            required: self.required,
            qualifiers: instances,
        })
    }
}
