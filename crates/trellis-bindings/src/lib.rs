//! Annotation metadata: qualifiers, interceptor bindings, and stereotypes.
//!
//! The scanner collaborator registers annotation declarations (which members
//! exist, which are non-binding, what meta-annotations are present) into an
//! [`AnnotationStore`]. Everything else in this crate is derived metadata,
//! computed lazily and memoized per annotation type for the lifetime of the
//! owning deployment: [`BindingModel`]s, [`StereotypeModel`]s, and the
//! optimized [`QualifierInstance`] representation whose equality and hash
//! look only at binding members.

mod annotations;
mod merge;
mod models;
mod qualifier;

pub use annotations::{
    AnnotationDecl, AnnotationKind, AnnotationMember, AnnotationStore, AnnotationTypeId,
    AnnotationValue, RawAnnotation, ALTERNATIVE, ANY, DEFAULT, NAMED,
};
pub use merge::{merge_interceptor_bindings, BindingConflict, MergedBindings};
pub use models::{BindingModel, BindingStore, StereotypeModel};
pub use qualifier::{normalize_qualifiers, QualifierInstance, QualifierSet};
