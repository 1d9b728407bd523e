//! Beans and their construction-time checks.

use serde::{Deserialize, Serialize};

use trellis_bindings::{
    merge_interceptor_bindings, normalize_qualifiers, AnnotationTypeId, AnnotationValue,
    BindingStore, MergedBindings, QualifierSet, RawAnnotation, NAMED,
};
use trellis_core::{DefinitionError, Problems};
use trellis_types::{
    arity_mismatch, display, is_illegal_bean_type, type_closure, ClassId, Type, TypeEnv,
};

/// Index of a bean in the aggregated deployment closure. Assigned when the
/// closure is built, in archive order then registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BeanId(pub u32);

/// Index of an observer method in the deployment closure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObserverId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeanKind {
    Managed,
    Producer,
    Interceptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterceptionKind {
    AroundInvoke,
    AroundTimeout,
    PostConstruct,
    PreDestroy,
}

/// A registered injectable component.
///
/// Created once during class processing via [`BeanBuilder`] and never
/// mutated after registration; specialization links live in the deployment
/// closure, not on the bean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bean {
    pub bean_class: ClassId,
    pub kind: BeanKind,
    /// The full type closure this bean can satisfy.
    pub types: Vec<Type>,
    /// Normalized: always contains `@Any`, and `@Default` unless another
    /// qualifier besides `@Named` is declared.
    pub qualifiers: QualifierSet,
    pub scope: Option<AnnotationTypeId>,
    pub alternative: bool,
    pub stereotypes: Vec<AnnotationTypeId>,
    pub name: Option<String>,
    pub priority: Option<i32>,
    /// The class this bean specializes, if any. Resolved to a concrete bean
    /// when the deployment closure is built.
    pub specializes: Option<ClassId>,
    /// Merged interceptor bindings: class-level declarations plus bindings
    /// inherited from stereotypes and meta-annotations. On an interceptor
    /// bean these are what it is bound to; on any other bean they describe
    /// how it gets intercepted.
    pub interceptor_bindings: MergedBindings,
    /// For interceptor beans: the interception kinds implemented.
    pub intercepts: Vec<InterceptionKind>,
}

impl Bean {
    /// A human-readable label for diagnostics.
    pub fn label(&self, env: &dyn TypeEnv) -> String {
        env.class(self.bean_class)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| format!("bean-class#{}", self.bean_class.0))
    }
}

/// An observer method declaration, matched by the covariant event rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observer {
    pub declaring_class: ClassId,
    pub observed_type: Type,
    /// Declared qualifiers, deliberately not normalized: an observer with no
    /// qualifiers receives every matching event.
    pub qualifiers: QualifierSet,
}

/// Builds a [`Bean`], running the registration-time checks and reporting
/// failures through the supplied [`Problems`] sink. A failed build returns
/// `None` and never aborts processing of sibling beans.
pub struct BeanBuilder<'a> {
    env: &'a dyn TypeEnv,
    bindings: &'a BindingStore,
    bean_class: ClassId,
    kind: BeanKind,
    declared_type: Option<Type>,
    explicit_types: Option<Vec<Type>>,
    qualifiers: Vec<RawAnnotation>,
    scope: Option<AnnotationTypeId>,
    alternative: bool,
    stereotypes: Vec<AnnotationTypeId>,
    name: Option<String>,
    priority: Option<i32>,
    specializes: Option<ClassId>,
    declared_bindings: Vec<RawAnnotation>,
    intercepts: Vec<InterceptionKind>,
}

impl<'a> BeanBuilder<'a> {
    pub fn new(env: &'a dyn TypeEnv, bindings: &'a BindingStore, bean_class: ClassId) -> Self {
        Self {
            env,
            bindings,
            bean_class,
            kind: BeanKind::Managed,
            declared_type: None,
            explicit_types: None,
            qualifiers: Vec::new(),
            scope: None,
            alternative: false,
            stereotypes: Vec::new(),
            name: None,
            priority: None,
            specializes: None,
            declared_bindings: Vec::new(),
            intercepts: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: BeanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Derive the bean's types from this declared type's closure. Defaults
    /// to the bean class itself.
    pub fn typed(mut self, declared: Type) -> Self {
        self.declared_type = Some(declared);
        self
    }

    /// Use an explicit type set (producer beans restricted via `@Typed`).
    pub fn with_types(mut self, types: Vec<Type>) -> Self {
        self.explicit_types = Some(types);
        self
    }

    pub fn qualifier(mut self, qualifier: RawAnnotation) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn scope(mut self, scope: AnnotationTypeId) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    pub fn stereotype(mut self, stereotype: AnnotationTypeId) -> Self {
        self.stereotypes.push(stereotype);
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn specializes(mut self, class: ClassId) -> Self {
        self.specializes = Some(class);
        self
    }

    /// Declare this bean as an interceptor bound to `bindings`. The merged
    /// binding map (class-level plus inherited) is computed at build time.
    pub fn interceptor(
        mut self,
        bindings: Vec<RawAnnotation>,
        intercepts: Vec<InterceptionKind>,
    ) -> Self {
        self.kind = BeanKind::Interceptor;
        self.declared_bindings = bindings;
        self.intercepts = intercepts;
        self
    }

    /// Class-level interceptor bindings on a non-interceptor bean (the
    /// beans that get intercepted).
    pub fn bound_with(mut self, binding: RawAnnotation) -> Self {
        self.declared_bindings.push(binding);
        self
    }

    pub fn build(mut self, problems: &mut Problems) -> Option<Bean> {
        let label = self
            .env
            .class(self.bean_class)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| format!("bean-class#{}", self.bean_class.0));

        let types = match self.explicit_types.take() {
            Some(types) => types,
            None => {
                let declared = self
                    .declared_type
                    .take()
                    .unwrap_or_else(|| Type::class(self.bean_class, vec![]));
                type_closure(self.env, &declared)
            }
        };

        let mut failed = false;
        for ty in &types {
            if let Some(mismatch) = arity_mismatch(self.env, ty) {
                problems.push_definition(DefinitionError::TypeArgumentArity {
                    class: mismatch.class,
                    expected: mismatch.expected,
                    actual: mismatch.actual,
                });
                failed = true;
            }
            if is_illegal_bean_type(self.env, ty) {
                problems.push_definition(DefinitionError::IllegalBeanType {
                    bean: label.clone(),
                    ty: display(self.env, ty),
                });
                failed = true;
            }
        }

        // Stereotypes contribute defaults before normalization, plus the
        // interceptor bindings they carry.
        let mut name_defaulted = false;
        let mut inherited_bindings: Vec<RawAnnotation> = Vec::new();
        for stereotype in &self.stereotypes {
            match self.bindings.stereotype_model(*stereotype) {
                Ok(model) => {
                    if self.scope.is_none() {
                        self.scope = model.default_scope;
                    }
                    self.alternative |= model.alternative;
                    name_defaulted |= model.name_defaulted;
                    inherited_bindings.extend(model.interceptor_bindings.iter().cloned());
                }
                Err(error) => {
                    problems.push_definition(error);
                    failed = true;
                }
            }
        }

        // Bindings also inherit through their own meta-annotations; the
        // binding model carries the transitively flattened set.
        let mut binding_sources = self.declared_bindings.clone();
        binding_sources.extend(inherited_bindings.iter().cloned());
        for binding in &binding_sources {
            match self.bindings.binding_model(binding.decl) {
                Ok(model) => {
                    inherited_bindings.extend(model.inherited_bindings.iter().cloned());
                }
                Err(error) => {
                    problems.push_definition(error);
                    failed = true;
                }
            }
        }

        let interceptor_bindings =
            match merge_interceptor_bindings(self.bindings, &self.declared_bindings, &inherited_bindings)
            {
                Ok(merged) => merged,
                Err(conflict) => {
                    if conflict.inherited {
                        problems.push_deployment(
                            conflict.to_deployment_error(self.bindings, &label),
                        );
                    } else {
                        problems.push_definition(
                            conflict.to_definition_error(self.bindings, &label),
                        );
                    }
                    failed = true;
                    MergedBindings::new()
                }
            };

        let qualifiers = match normalize_qualifiers(&self.qualifiers, self.bindings) {
            Ok(qualifiers) => qualifiers,
            Err(error) => {
                problems.push_definition(error);
                return None;
            }
        };

        // The bean name comes from an explicit @Named value, an explicit
        // builder name, or stereotype name defaulting (decapitalized simple
        // class name), in that order.
        let named_value = qualifiers
            .iter()
            .find(|q| q.annotation_type() == NAMED)
            .and_then(|q| match q.value("value") {
                Some(AnnotationValue::Str(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            });
        let name = named_value.or(self.name).or_else(|| {
            name_defaulted.then(|| default_bean_name(&label))
        });

        if failed {
            return None;
        }

        Some(Bean {
            bean_class: self.bean_class,
            kind: self.kind,
            types,
            qualifiers,
            scope: self.scope,
            alternative: self.alternative,
            stereotypes: self.stereotypes,
            name,
            priority: self.priority,
            specializes: self.specializes,
            interceptor_bindings,
            intercepts: self.intercepts,
        })
    }
}

/// The decapitalized simple class name, e.g. `com.acme.PaymentService` →
/// `paymentService`.
fn default_bean_name(class_name: &str) -> String {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_bindings::{AnnotationDecl, AnnotationKind, AnnotationStore, ALTERNATIVE};
    use trellis_types::{ClassDef, ClassKind, TypeStore, WildcardBound};

    fn fixtures() -> (TypeStore, BindingStore, ClassId) {
        let mut types = TypeStore::with_minimal_jdk();
        let object = Type::class(types.well_known().object, vec![]);
        let service = types.add_class(ClassDef {
            name: "com.acme.PaymentService".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object),
            interfaces: vec![],
        });
        (types, BindingStore::new(AnnotationStore::new()), service)
    }

    #[test]
    fn default_types_are_the_class_closure() {
        let (types, bindings, service) = fixtures();
        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .build(&mut problems)
            .unwrap();

        assert!(bean.types.contains(&Type::class(service, vec![])));
        assert!(bean
            .types
            .contains(&Type::class(types.well_known().object, vec![])));
        assert!(!problems.is_fatal());
    }

    #[test]
    fn normalization_produces_any_and_default() {
        let (types, bindings, service) = fixtures();
        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .build(&mut problems)
            .unwrap();
        assert_eq!(bean.qualifiers.len(), 2);
    }

    #[test]
    fn illegal_bean_types_fail_the_build_but_not_the_boot() {
        let (types, bindings, service) = fixtures();
        let list = types.class_id("java.util.List").unwrap();
        let wildcard_list = Type::class(
            list,
            vec![Type::Wildcard(WildcardBound::Unbounded)],
        );

        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .with_types(vec![wildcard_list])
            .build(&mut problems);

        assert!(bean.is_none());
        assert_eq!(problems.definition_errors().len(), 1);

        // A sibling bean still builds fine against the same sink.
        let sibling = BeanBuilder::new(&types, &bindings, service).build(&mut problems);
        assert!(sibling.is_some());
    }

    #[test]
    fn named_qualifier_sets_the_bean_name() {
        let (types, bindings, service) = fixtures();
        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .qualifier(RawAnnotation::named("payments"))
            .build(&mut problems)
            .unwrap();
        assert_eq!(bean.name.as_deref(), Some("payments"));
        // @Named alone keeps @Default.
        assert_eq!(bean.qualifiers.len(), 3);
    }

    #[test]
    fn class_level_bindings_shadow_stereotype_bindings_silently() {
        let (types, _, service) = fixtures();
        let mut annotations = AnnotationStore::new();
        let secured = annotations.add(
            AnnotationDecl::new("com.acme.Secured", AnnotationKind::InterceptorBinding)
                .with_members(vec![trellis_bindings::AnnotationMember::binding("realm")]),
        );
        let stereotype = annotations.add(
            AnnotationDecl::new("com.acme.Web", AnnotationKind::Stereotype).with_meta(vec![
                RawAnnotation::with_value(
                    secured,
                    "realm",
                    trellis_bindings::AnnotationValue::string("users"),
                ),
            ]),
        );
        let bindings = BindingStore::new(annotations);

        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .stereotype(stereotype)
            .bound_with(RawAnnotation::with_value(
                secured,
                "realm",
                trellis_bindings::AnnotationValue::string("admin"),
            ))
            .build(&mut problems)
            .unwrap();

        assert!(!problems.is_fatal());
        assert_eq!(
            bean.interceptor_bindings[&secured],
            vec![RawAnnotation::with_value(
                secured,
                "realm",
                trellis_bindings::AnnotationValue::string("admin"),
            )]
        );
    }

    #[test]
    fn conflicting_stereotype_bindings_are_a_deployment_error() {
        let (types, _, service) = fixtures();
        let mut annotations = AnnotationStore::new();
        let secured = annotations.add(
            AnnotationDecl::new("com.acme.Secured", AnnotationKind::InterceptorBinding)
                .with_members(vec![trellis_bindings::AnnotationMember::binding("realm")]),
        );
        let realm = |value: &str| {
            RawAnnotation::with_value(
                secured,
                "realm",
                trellis_bindings::AnnotationValue::string(value),
            )
        };
        let web = annotations.add(
            AnnotationDecl::new("com.acme.Web", AnnotationKind::Stereotype)
                .with_meta(vec![realm("users")]),
        );
        let batch = annotations.add(
            AnnotationDecl::new("com.acme.Batch", AnnotationKind::Stereotype)
                .with_meta(vec![realm("admin")]),
        );
        let bindings = BindingStore::new(annotations);

        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .stereotype(web)
            .stereotype(batch)
            .build(&mut problems);

        assert!(bean.is_none());
        assert_eq!(problems.deployment_errors().len(), 1);
    }

    #[test]
    fn stereotypes_contribute_scope_alternative_and_name() {
        let (types, _, service) = fixtures();
        let mut annotations = AnnotationStore::new();
        let scope = annotations.add(AnnotationDecl::new(
            "jakarta.enterprise.context.ApplicationScoped",
            AnnotationKind::Scope,
        ));
        let stereotype = annotations.add(
            AnnotationDecl::new("com.acme.Web", AnnotationKind::Stereotype).with_meta(vec![
                RawAnnotation::marker(scope),
                RawAnnotation::marker(ALTERNATIVE),
                RawAnnotation::marker(NAMED),
            ]),
        );
        let bindings = BindingStore::new(annotations);

        let mut problems = Problems::new();
        let bean = BeanBuilder::new(&types, &bindings, service)
            .stereotype(stereotype)
            .build(&mut problems)
            .unwrap();

        assert_eq!(bean.scope, Some(scope));
        assert!(bean.alternative);
        assert_eq!(bean.name.as_deref(), Some("paymentService"));
    }
}
