//! Derived per-annotation-type metadata, memoized for the deployment's
//! lifetime.

use std::collections::BTreeSet;
use std::sync::Arc;

use trellis_core::{DefinitionError, Memo};

use crate::annotations::{
    AnnotationDecl, AnnotationKind, AnnotationStore, AnnotationTypeId, RawAnnotation, ALTERNATIVE,
    NAMED,
};

/// Which members of an annotation type participate in equality, and which
/// other interceptor bindings it transitively implies through
/// meta-annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingModel {
    pub binding_members: BTreeSet<String>,
    pub inherited_bindings: Vec<RawAnnotation>,
}

/// Stereotype metadata: the defaults and annotations a stereotype confers on
/// beans that carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StereotypeModel {
    pub default_scope: Option<AnnotationTypeId>,
    pub alternative: bool,
    /// The stereotype carries an empty `@Named`, defaulting the bean name.
    pub name_defaulted: bool,
    pub inherited_stereotypes: Vec<AnnotationTypeId>,
    pub interceptor_bindings: Vec<RawAnnotation>,
}

/// The memoized metadata store for one deployment.
///
/// Models are computed on first use and cached until the owning deployment
/// context is disposed. A failed computation is reported against the
/// triggering bean and never cached.
#[derive(Debug)]
pub struct BindingStore {
    annotations: AnnotationStore,
    binding_models: Memo<AnnotationTypeId, BindingModel>,
    stereotype_models: Memo<AnnotationTypeId, StereotypeModel>,
}

impl BindingStore {
    pub fn new(annotations: AnnotationStore) -> Self {
        Self {
            annotations,
            binding_models: Memo::new(),
            stereotype_models: Memo::new(),
        }
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.annotations
    }

    pub fn binding_model(
        &self,
        id: AnnotationTypeId,
    ) -> Result<Arc<BindingModel>, DefinitionError> {
        self.binding_models
            .get_or_try_insert_with(&id, || compute_binding_model(&self.annotations, id))
    }

    pub fn stereotype_model(
        &self,
        id: AnnotationTypeId,
    ) -> Result<Arc<StereotypeModel>, DefinitionError> {
        self.stereotype_models
            .get_or_try_insert_with(&id, || compute_stereotype_model(&self.annotations, id))
    }

    /// Drop cached models for one annotation type. Called after an extension
    /// modifies an annotation through the SPI.
    pub fn clear_annotation_data(&self, id: AnnotationTypeId) {
        self.binding_models.remove(&id);
        self.stereotype_models.remove(&id);
    }

    pub fn clear(&self) {
        tracing::debug!("clearing binding metadata caches");
        self.binding_models.clear();
        self.stereotype_models.clear();
    }
}

fn compute_binding_model(
    annotations: &AnnotationStore,
    id: AnnotationTypeId,
) -> Result<BindingModel, DefinitionError> {
    let decl = decl_of(annotations, id)?;

    let binding_members = decl
        .members
        .iter()
        .filter(|m| !m.nonbinding)
        .map(|m| m.name.clone())
        .collect();

    // Interceptor bindings inherit every interceptor binding present as a
    // meta-annotation, transitively. Qualifiers inherit nothing.
    let mut inherited_bindings = Vec::new();
    if decl.kind == AnnotationKind::InterceptorBinding {
        let mut seen = BTreeSet::from([id]);
        collect_inherited_bindings(annotations, decl, &mut seen, &mut inherited_bindings);
    }

    Ok(BindingModel {
        binding_members,
        inherited_bindings,
    })
}

fn collect_inherited_bindings(
    annotations: &AnnotationStore,
    decl: &AnnotationDecl,
    seen: &mut BTreeSet<AnnotationTypeId>,
    out: &mut Vec<RawAnnotation>,
) {
    for meta in &decl.meta {
        let Some(meta_decl) = annotations.decl(meta.decl) else {
            continue;
        };
        if meta_decl.kind != AnnotationKind::InterceptorBinding || !seen.insert(meta.decl) {
            continue;
        }
        out.push(meta.clone());
        collect_inherited_bindings(annotations, meta_decl, seen, out);
    }
}

fn compute_stereotype_model(
    annotations: &AnnotationStore,
    id: AnnotationTypeId,
) -> Result<StereotypeModel, DefinitionError> {
    let decl = decl_of(annotations, id)?;

    let mut model = StereotypeModel {
        default_scope: None,
        alternative: false,
        name_defaulted: false,
        inherited_stereotypes: Vec::new(),
        interceptor_bindings: Vec::new(),
    };

    for meta in &decl.meta {
        if meta.decl == ALTERNATIVE {
            model.alternative = true;
            continue;
        }
        if meta.decl == NAMED {
            model.name_defaulted = true;
            continue;
        }
        let Some(meta_decl) = annotations.decl(meta.decl) else {
            continue;
        };
        match meta_decl.kind {
            AnnotationKind::Scope => model.default_scope = Some(meta.decl),
            AnnotationKind::Stereotype => model.inherited_stereotypes.push(meta.decl),
            AnnotationKind::InterceptorBinding => model.interceptor_bindings.push(meta.clone()),
            AnnotationKind::Qualifier | AnnotationKind::Plain => {}
        }
    }

    Ok(model)
}

fn decl_of<'a>(
    annotations: &'a AnnotationStore,
    id: AnnotationTypeId,
) -> Result<&'a AnnotationDecl, DefinitionError> {
    annotations
        .decl(id)
        .ok_or_else(|| DefinitionError::QualifierValueUnreadable {
            qualifier: format!("annotation#{}", id.0),
            member: "<declaration>".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationMember;
    use pretty_assertions::assert_eq;

    fn store_with(decls: Vec<AnnotationDecl>) -> (BindingStore, Vec<AnnotationTypeId>) {
        let mut annotations = AnnotationStore::new();
        let ids = decls.into_iter().map(|d| annotations.add(d)).collect();
        (BindingStore::new(annotations), ids)
    }

    #[test]
    fn binding_members_exclude_nonbinding() {
        let (store, ids) = store_with(vec![AnnotationDecl::new(
            "com.acme.Tuned",
            AnnotationKind::Qualifier,
        )
        .with_members(vec![
            AnnotationMember::binding("value"),
            AnnotationMember::nonbinding("comment"),
        ])]);

        let model = store.binding_model(ids[0]).unwrap();
        assert_eq!(
            model.binding_members,
            BTreeSet::from(["value".to_string()])
        );
        assert!(model.inherited_bindings.is_empty());
    }

    #[test]
    fn interceptor_bindings_inherit_transitively() {
        let mut annotations = AnnotationStore::new();
        let base = annotations.add(AnnotationDecl::new(
            "com.acme.Monitored",
            AnnotationKind::InterceptorBinding,
        ));
        let mid = annotations.add(
            AnnotationDecl::new("com.acme.Timed", AnnotationKind::InterceptorBinding)
                .with_meta(vec![RawAnnotation::marker(base)]),
        );
        let top = annotations.add(
            AnnotationDecl::new("com.acme.Audited", AnnotationKind::InterceptorBinding)
                .with_meta(vec![RawAnnotation::marker(mid)]),
        );
        let store = BindingStore::new(annotations);

        let model = store.binding_model(top).unwrap();
        let inherited: Vec<AnnotationTypeId> =
            model.inherited_bindings.iter().map(|b| b.decl).collect();
        assert_eq!(inherited, vec![mid, base]);
    }

    #[test]
    fn models_are_memoized_until_cleared() {
        let (store, ids) = store_with(vec![AnnotationDecl::new(
            "com.acme.Q",
            AnnotationKind::Qualifier,
        )]);
        let a = store.binding_model(ids[0]).unwrap();
        let b = store.binding_model(ids[0]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        store.clear_annotation_data(ids[0]);
        let c = store.binding_model(ids[0]).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn stereotype_model_reads_meta_annotations() {
        let mut annotations = AnnotationStore::new();
        let scope = annotations.add(AnnotationDecl::new(
            "jakarta.enterprise.context.RequestScoped",
            AnnotationKind::Scope,
        ));
        let binding = annotations.add(AnnotationDecl::new(
            "com.acme.Secured",
            AnnotationKind::InterceptorBinding,
        ));
        let parent = annotations.add(AnnotationDecl::new(
            "com.acme.BaseStereotype",
            AnnotationKind::Stereotype,
        ));
        let stereotype = annotations.add(
            AnnotationDecl::new("com.acme.WebAction", AnnotationKind::Stereotype).with_meta(vec![
                RawAnnotation::marker(scope),
                RawAnnotation::marker(ALTERNATIVE),
                RawAnnotation::marker(NAMED),
                RawAnnotation::marker(binding),
                RawAnnotation::marker(parent),
            ]),
        );
        let store = BindingStore::new(annotations);

        let model = store.stereotype_model(stereotype).unwrap();
        assert_eq!(model.default_scope, Some(scope));
        assert!(model.alternative);
        assert!(model.name_defaulted);
        assert_eq!(model.inherited_stereotypes, vec![parent]);
        assert_eq!(model.interceptor_bindings, vec![RawAnnotation::marker(binding)]);
    }
}
