//! The deployment closure: the aggregated, indexed view of all beans
//! visible to a deployment, plus the specialization registry.
//!
//! Specialization and "most specialized bean" must be computed over the
//! whole accessible closure, not per archive, so this view is built once
//! per closure and shared.

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use trellis_core::{DeploymentError, Problems};
use trellis_types::{ClassId, PrimitiveType, Type, TypeEnv};

use crate::archive::BeanArchive;
use crate::bean::{Bean, BeanId, BeanKind, Observer, ObserverId};
use crate::enablement::Enablement;

/// The erased index key of a bean type: class identity with primitives
/// boxed at the top level and array components kept distinct (`int[]` and
/// `Integer[]` are different keys, `int` and `Integer` are not).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKey {
    Class(ClassId),
    Array(Box<TypeKey>),
    PrimitiveArrayComponent(PrimitiveType),
}

impl TypeKey {
    /// The key a *top-level* type is indexed under, or `None` for type
    /// variables and wildcards (which are never indexed).
    pub fn of(env: &dyn TypeEnv, ty: &Type) -> Option<TypeKey> {
        match ty {
            Type::Class(ct) => Some(TypeKey::Class(ct.def)),
            Type::Primitive(p) => Some(TypeKey::Class(env.well_known().wrapper_of(*p))),
            Type::Array(component) => Some(TypeKey::Array(Box::new(Self::component_key(
                env, component,
            )?))),
            Type::TypeVar(_) | Type::Wildcard(_) => None,
        }
    }

    fn component_key(env: &dyn TypeEnv, ty: &Type) -> Option<TypeKey> {
        match ty {
            Type::Primitive(p) => Some(TypeKey::PrimitiveArrayComponent(*p)),
            Type::Class(ct) => Some(TypeKey::Class(ct.def)),
            Type::Array(component) => Some(TypeKey::Array(Box::new(Self::component_key(
                env, component,
            )?))),
            Type::TypeVar(_) | Type::Wildcard(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct DeploymentClosure {
    beans: Vec<Bean>,
    observers: Vec<Observer>,
    enablement: Enablement,
    /// specializer → specialized.
    overrides: HashMap<BeanId, BeanId>,
    /// specialized → specializer (the reverse edge, for suppression).
    overridden_by: HashMap<BeanId, BeanId>,
    /// Raw-type index, built lazily on first candidate lookup.
    by_type: OnceCell<HashMap<TypeKey, Vec<BeanId>>>,
    by_name: HashMap<String, Vec<BeanId>>,
}

impl DeploymentClosure {
    /// Aggregate the accessible archives into one closure.
    ///
    /// Bean ids are assigned in archive order then registration order, which
    /// fixes the deterministic ordering every later tie-break relies on.
    /// Specialization declarations are resolved here; a missing target or a
    /// cycle is a deployment error.
    pub fn build(
        env: &dyn TypeEnv,
        archives: Vec<BeanArchive>,
        enablement: Enablement,
        problems: &mut Problems,
    ) -> Self {
        let mut beans = Vec::new();
        let mut observers = Vec::new();
        for archive in archives {
            debug_assert!(archive.is_closed(), "closure built over an open archive");
            let (archive_beans, archive_observers) = archive.into_parts();
            beans.extend(archive_beans);
            observers.extend(archive_observers);
        }

        let mut closure = Self {
            beans,
            observers,
            enablement,
            overrides: HashMap::new(),
            overridden_by: HashMap::new(),
            by_type: OnceCell::new(),
            by_name: HashMap::new(),
        };
        closure.link_specializations(env, problems);
        closure.index_names();
        closure
    }

    fn link_specializations(&mut self, env: &dyn TypeEnv, problems: &mut Problems) {
        for (index, bean) in self.beans.iter().enumerate() {
            let Some(target_class) = bean.specializes else {
                continue;
            };
            let specializer = BeanId(index as u32);
            let specialized = self.beans.iter().enumerate().position(|(pos, candidate)| {
                pos != index
                    && candidate.bean_class == target_class
                    && candidate.kind != BeanKind::Interceptor
            });
            match specialized {
                Some(target) => {
                    let specialized = BeanId(target as u32);
                    self.overrides.insert(specializer, specialized);
                    if self.overridden_by.insert(specialized, specializer).is_some() {
                        problems.push_deployment(DeploymentError::SpecializedTwice {
                            bean: self.beans[specialized.0 as usize].label(env),
                        });
                    }
                }
                None => {
                    problems.push_deployment(DeploymentError::UnresolvableSpecialization {
                        bean: bean.label(env),
                    });
                }
            }
        }

        // The override relation must be acyclic; report each cycle once and
        // break it so most_specialized terminates.
        let starts: Vec<BeanId> = self.overrides.keys().copied().collect();
        let mut reported: HashSet<BeanId> = HashSet::new();
        for start in starts {
            let mut current = start;
            let mut seen = HashSet::from([start]);
            while let Some(next) = self.overrides.get(&current).copied() {
                if !seen.insert(next) {
                    if reported.insert(next) {
                        problems.push_deployment(DeploymentError::SpecializationCycle {
                            bean: self.beans[next.0 as usize].label(env),
                        });
                        self.overrides.remove(&current);
                        self.overridden_by.remove(&next);
                    }
                    break;
                }
                current = next;
            }
        }
    }

    fn index_names(&mut self) {
        for (index, bean) in self.beans.iter().enumerate() {
            if let Some(name) = &bean.name {
                self.by_name
                    .entry(name.clone())
                    .or_default()
                    .push(BeanId(index as u32));
            }
        }
    }

    pub fn beans(&self) -> impl Iterator<Item = (BeanId, &Bean)> {
        self.beans
            .iter()
            .enumerate()
            .map(|(index, bean)| (BeanId(index as u32), bean))
    }

    pub fn bean(&self, id: BeanId) -> &Bean {
        &self.beans[id.0 as usize]
    }

    pub fn observers(&self) -> impl Iterator<Item = (ObserverId, &Observer)> {
        self.observers
            .iter()
            .enumerate()
            .map(|(index, observer)| (ObserverId(index as u32), observer))
    }

    pub fn observer(&self, id: ObserverId) -> &Observer {
        &self.observers[id.0 as usize]
    }

    pub fn enablement(&self) -> &Enablement {
        &self.enablement
    }

    /// Candidate beans for a required type, via the raw-type index. A
    /// required `Object` falls back to every bean, since every bean's
    /// closure reaches it.
    pub fn candidates_for(&self, env: &dyn TypeEnv, required: &Type) -> Vec<BeanId> {
        if required.raw_class() == Some(env.well_known().object) {
            return (0..self.beans.len() as u32).map(BeanId).collect();
        }
        let Some(key) = TypeKey::of(env, required) else {
            return Vec::new();
        };
        self.type_index(env)
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn beans_named(&self, name: &str) -> &[BeanId] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Follow override edges from `id` to the bean nothing else overrides.
    pub fn most_specialized(&self, id: BeanId) -> BeanId {
        let mut current = id;
        while let Some(specializer) = self.overridden_by.get(&current) {
            current = *specializer;
        }
        current
    }

    /// Is `id` overridden by a bean that is itself in the candidate set?
    /// Suppression only applies when the specializing bean is a live
    /// candidate for the same request.
    pub fn is_suppressed(&self, id: BeanId, candidates: &[BeanId]) -> bool {
        self.overridden_by
            .get(&id)
            .is_some_and(|specializer| candidates.contains(specializer))
    }

    fn type_index(&self, env: &dyn TypeEnv) -> &HashMap<TypeKey, Vec<BeanId>> {
        self.by_type.get_or_init(|| {
            tracing::debug!(beans = self.beans.len(), "building raw-type bean index");
            let mut index: HashMap<TypeKey, Vec<BeanId>> = HashMap::new();
            for (id, bean) in self.beans.iter().enumerate() {
                let id = BeanId(id as u32);
                let mut keys: HashSet<TypeKey> = HashSet::new();
                for ty in &bean.types {
                    if let Some(key) = TypeKey::of(env, ty) {
                        keys.insert(key);
                    }
                }
                for key in keys {
                    index.entry(key).or_default().push(id);
                }
            }
            for entry in index.values_mut() {
                entry.sort_unstable();
            }
            index
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_bindings::{AnnotationStore, BindingStore};
    use trellis_types::{ClassDef, ClassKind, TypeStore};

    struct Fixture {
        types: TypeStore,
        bindings: BindingStore,
        service: ClassId,
        basic: ClassId,
        premium: ClassId,
    }

    fn fixture() -> Fixture {
        let mut types = TypeStore::with_minimal_jdk();
        let object = Type::class(types.well_known().object, vec![]);
        let service = types.add_class(ClassDef {
            name: "com.acme.Service".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
        });
        let basic = types.add_class(ClassDef {
            name: "com.acme.BasicService".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object.clone()),
            interfaces: vec![Type::class(service, vec![])],
        });
        let premium = types.add_class(ClassDef {
            name: "com.acme.PremiumService".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(Type::class(basic, vec![])),
            interfaces: vec![],
        });
        Fixture {
            types,
            bindings: BindingStore::new(AnnotationStore::new()),
            service,
            basic,
            premium,
        }
    }

    fn build_closure(fixture: &Fixture, specialize: bool) -> (DeploymentClosure, Problems) {
        let mut problems = Problems::new();
        let mut archive = BeanArchive::new("app");

        let basic = crate::BeanBuilder::new(&fixture.types, &fixture.bindings, fixture.basic)
            .build(&mut problems)
            .unwrap();
        archive.register(basic);

        let mut premium_builder =
            crate::BeanBuilder::new(&fixture.types, &fixture.bindings, fixture.premium);
        if specialize {
            premium_builder = premium_builder.specializes(fixture.basic);
        }
        archive.register(premium_builder.build(&mut problems).unwrap());
        archive.close();

        let closure = DeploymentClosure::build(
            &fixture.types,
            vec![archive],
            Enablement::empty(),
            &mut problems,
        );
        (closure, problems)
    }

    #[test]
    fn raw_type_index_finds_candidates_through_supertypes() {
        let fixture = fixture();
        let (closure, problems) = build_closure(&fixture, false);
        assert!(!problems.is_fatal());

        let required = Type::class(fixture.service, vec![]);
        let candidates = closure.candidates_for(&fixture.types, &required);
        assert_eq!(candidates, vec![BeanId(0), BeanId(1)]);

        let object = Type::class(fixture.types.well_known().object, vec![]);
        assert_eq!(
            closure.candidates_for(&fixture.types, &object).len(),
            2
        );
    }

    #[test]
    fn specialization_links_and_most_specialized() {
        let fixture = fixture();
        let (closure, problems) = build_closure(&fixture, true);
        assert!(!problems.is_fatal());

        assert_eq!(closure.most_specialized(BeanId(0)), BeanId(1));
        assert!(closure.is_suppressed(BeanId(0), &[BeanId(0), BeanId(1)]));
        // Suppression only applies when the specializer is a co-candidate.
        assert!(!closure.is_suppressed(BeanId(0), &[BeanId(0)]));
    }

    #[test]
    fn unresolvable_specialization_is_a_deployment_error() {
        let fixture = fixture();
        let mut problems = Problems::new();
        let mut archive = BeanArchive::new("app");
        let orphan = crate::BeanBuilder::new(&fixture.types, &fixture.bindings, fixture.premium)
            .specializes(fixture.basic)
            .build(&mut problems)
            .unwrap();
        archive.register(orphan);
        archive.close();

        let _ = DeploymentClosure::build(
            &fixture.types,
            vec![archive],
            Enablement::empty(),
            &mut problems,
        );
        assert_eq!(problems.deployment_errors().len(), 1);
    }

    #[test]
    fn closure_aggregates_accessible_archives() {
        let fixture = fixture();
        let mut problems = Problems::new();

        let mut app = BeanArchive::new("app");
        app.register(
            crate::BeanBuilder::new(&fixture.types, &fixture.bindings, fixture.basic)
                .build(&mut problems)
                .unwrap(),
        );
        app.close();

        let mut lib = BeanArchive::new("lib");
        lib.register(
            crate::BeanBuilder::new(&fixture.types, &fixture.bindings, fixture.premium)
                .specializes(fixture.basic)
                .build(&mut problems)
                .unwrap(),
        );
        lib.close();

        let closure = DeploymentClosure::build(
            &fixture.types,
            vec![app, lib],
            Enablement::empty(),
            &mut problems,
        );
        assert!(!problems.is_fatal());

        // Ids follow archive order, and specialization links across
        // archives because suppression is a closure-level concern.
        let required = Type::class(fixture.service, vec![]);
        assert_eq!(
            closure.candidates_for(&fixture.types, &required),
            vec![BeanId(0), BeanId(1)]
        );
        assert_eq!(closure.most_specialized(BeanId(0)), BeanId(1));
    }

    #[test]
    fn primitive_and_wrapper_share_an_index_key() {
        let types = TypeStore::with_minimal_jdk();
        let wk = types.well_known().clone();
        let int_key = TypeKey::of(&types, &Type::Primitive(PrimitiveType::Int)).unwrap();
        let integer_key = TypeKey::of(&types, &Type::class(wk.integer, vec![])).unwrap();
        assert_eq!(int_key, integer_key);

        let int_array = TypeKey::of(&types, &Type::array(Type::Primitive(PrimitiveType::Int)));
        let integer_array = TypeKey::of(&types, &Type::array(Type::class(wk.integer, vec![])));
        assert_ne!(int_array, integer_array);
    }
}
