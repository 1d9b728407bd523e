//! The optimized qualifier representation used throughout resolution.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use trellis_core::DefinitionError;

use crate::annotations::{AnnotationTypeId, AnnotationValue, RawAnnotation, ANY, DEFAULT, NAMED};
use crate::models::BindingStore;

/// A qualifier (or interceptor binding) instance reduced to its identity:
/// the annotation type plus its binding-member values. Equality and the
/// precomputed hash ignore non-binding members entirely, which makes this
/// type safe to use as a cache and set key.
#[derive(Debug, Clone)]
pub struct QualifierInstance {
    decl: AnnotationTypeId,
    values: BTreeMap<String, AnnotationValue>,
    hash: u64,
}

pub type QualifierSet = BTreeSet<QualifierInstance>;

impl QualifierInstance {
    /// Build an instance from a raw annotation, consulting the binding model
    /// for its type to drop non-binding members and fill defaults.
    pub fn of(annotation: &RawAnnotation, store: &BindingStore) -> Result<Self, DefinitionError> {
        // The built-in marker qualifiers and @Named are hot paths with a
        // known shape; skip the model lookup for them.
        if annotation.decl == ANY {
            return Ok(Self::any());
        }
        if annotation.decl == DEFAULT {
            return Ok(Self::default_qualifier());
        }
        if annotation.decl == NAMED {
            let value = annotation
                .values
                .get("value")
                .cloned()
                .unwrap_or_else(|| AnnotationValue::string(""));
            return Ok(Self::new(NAMED, BTreeMap::from([("value".to_string(), value)])));
        }

        let model = store.binding_model(annotation.decl)?;
        let decl = store
            .annotations()
            .decl(annotation.decl)
            .expect("binding model implies declaration");

        let mut values = BTreeMap::new();
        for member in &model.binding_members {
            let value = annotation
                .values
                .get(member)
                .cloned()
                .or_else(|| decl.member(member).and_then(|m| m.default.clone()));
            match value {
                Some(value) => {
                    values.insert(member.clone(), value);
                }
                None => {
                    return Err(DefinitionError::QualifierValueUnreadable {
                        qualifier: decl.name.clone(),
                        member: member.clone(),
                    });
                }
            }
        }
        Ok(Self::new(annotation.decl, values))
    }

    pub fn any() -> Self {
        Self::new(ANY, BTreeMap::new())
    }

    pub fn default_qualifier() -> Self {
        Self::new(DEFAULT, BTreeMap::new())
    }

    fn new(decl: AnnotationTypeId, values: BTreeMap<String, AnnotationValue>) -> Self {
        let mut hasher = DefaultHasher::new();
        decl.hash(&mut hasher);
        values.hash(&mut hasher);
        let hash = hasher.finish();
        Self { decl, values, hash }
    }

    pub fn annotation_type(&self) -> AnnotationTypeId {
        self.decl
    }

    pub fn value(&self, member: &str) -> Option<&AnnotationValue> {
        self.values.get(member)
    }
}

impl PartialEq for QualifierInstance {
    fn eq(&self, other: &Self) -> bool {
        self.decl == other.decl && self.values == other.values
    }
}

impl Eq for QualifierInstance {}

impl Hash for QualifierInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialOrd for QualifierInstance {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualifierInstance {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.decl
            .cmp(&other.decl)
            .then_with(|| self.values.cmp(&other.values))
    }
}

/// Normalize the declared qualifiers of a bean.
///
/// An empty declaration yields `{@Any, @Default}`. Otherwise explicit
/// `@Any`/`@Default` are stripped; if nothing remains, or only `@Named`
/// remains, `@Default` is re-added; `@Any` is always added. Idempotent.
pub fn normalize_qualifiers(
    declared: &[RawAnnotation],
    store: &BindingStore,
) -> Result<QualifierSet, DefinitionError> {
    let mut set = QualifierSet::new();
    if declared.is_empty() {
        set.insert(QualifierInstance::any());
        set.insert(QualifierInstance::default_qualifier());
        return Ok(set);
    }

    for annotation in declared {
        if annotation.decl == ANY || annotation.decl == DEFAULT {
            continue;
        }
        set.insert(QualifierInstance::of(annotation, store)?);
    }

    let only_named = set.iter().all(|q| q.annotation_type() == NAMED);
    if set.is_empty() || only_named {
        set.insert(QualifierInstance::default_qualifier());
    }
    set.insert(QualifierInstance::any());
    Ok(set)
}
