//! The bean type model and assignability rules.
//!
//! Declared Java types are modeled as a closed set of variants ([`Type`])
//! interned against a [`TypeStore`]; all resolution algorithms operate on
//! these value types only, never on a host runtime's reflection facilities.
//!
//! Two distinct matching relations live here and must not be confused:
//! [`bean_rules`] implements the invariant type-safe-resolution matching used
//! for injection points, while [`event_rules`] implements the looser
//! covariant matching used for observer resolution. Both are layered over
//! the plain covariant assignability in [`covariant`], which is what
//! wildcard and type-variable bounds are checked against.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod bean_rules;
pub mod closure;
pub mod covariant;
pub mod event_rules;
pub mod validity;

pub use closure::{instantiate_as_supertype, type_closure};
pub use covariant::{is_assignable_from, is_more_specific};
pub use validity::{arity_mismatch, is_illegal_bean_type, ArityMismatch};

/// Index of a class definition in a [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Index of a type parameter definition in a [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A class or interface instantiation. Empty `args` on a generic definition
/// means the raw type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

/// A declared Java type as the container sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Primitive(PrimitiveType),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    /// An actual type: a class, parameterized, array, or primitive type, as
    /// opposed to a type variable or wildcard.
    pub fn is_actual(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array(_) | Type::Primitive(_)
        )
    }

    /// The class behind this type, if it is a (possibly parameterized) class
    /// type.
    pub fn raw_class(&self) -> Option<ClassId> {
        match self {
            Type::Class(ct) => Some(ct.def),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
}

/// Classes every deployment can rely on being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub char_sequence: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub comparable: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub character: ClassId,
    pub float: ClassId,
    pub double: ClassId,
}

impl WellKnownTypes {
    /// The wrapper class a primitive boxes to.
    pub fn wrapper_of(&self, primitive: PrimitiveType) -> ClassId {
        match primitive {
            PrimitiveType::Boolean => self.boolean,
            PrimitiveType::Byte => self.byte,
            PrimitiveType::Short => self.short,
            PrimitiveType::Int => self.integer,
            PrimitiveType::Long => self.long,
            PrimitiveType::Char => self.character,
            PrimitiveType::Float => self.float,
            PrimitiveType::Double => self.double,
        }
    }
}

/// Read access to class and type-parameter metadata.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// The backing store for class and type-parameter definitions.
///
/// Populated once by the scanner collaborator while a deployment boots, then
/// read-only for the lifetime of the deployment.
#[derive(Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store seeded with the handful of JDK classes the matching rules and
    /// boxing depend on (`Object`, the primitive wrappers, a few collection
    /// interfaces).
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore {
            classes: Vec::new(),
            type_params: Vec::new(),
            by_name: HashMap::new(),
            // Placeholder ids, fixed up below once the classes exist.
            well_known: WellKnownTypes {
                object: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
                char_sequence: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                comparable: ClassId(0),
                boolean: ClassId(0),
                byte: ClassId(0),
                short: ClassId(0),
                integer: ClassId(0),
                long: ClassId(0),
                character: ClassId(0),
                float: ClassId(0),
                double: ClassId(0),
            },
        };

        let object = store.add_root_class("java.lang.Object", ClassKind::Class);
        let object_ty = Type::class(object, vec![]);

        let cloneable = store.add_interface("java.lang.Cloneable", vec![]);
        let serializable = store.add_interface("java.io.Serializable", vec![]);
        let char_sequence = store.add_interface("java.lang.CharSequence", vec![]);

        let comparable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let comparable = store.add_class(ClassDef {
            name: "java.lang.Comparable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![comparable_t],
            super_class: None,
            interfaces: vec![],
        });

        let string = store.add_class(ClassDef {
            name: "java.lang.String".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object_ty.clone()),
            interfaces: vec![
                Type::class(char_sequence, vec![]),
                Type::class(serializable, vec![]),
            ],
        });

        let number = store.add_class(ClassDef {
            name: "java.lang.Number".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
        });

        let wrapper = |store: &mut TypeStore, name: &str, numeric: bool| {
            let superclass = if numeric { Type::class(number, vec![]) } else { object_ty.clone() };
            let id = store.add_class(ClassDef {
                name: name.to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(superclass),
                interfaces: vec![Type::class(serializable, vec![])],
            });
            let comparable_self = Type::class(comparable, vec![Type::class(id, vec![])]);
            store.classes[id.0 as usize].interfaces.push(comparable_self);
            id
        };

        let boolean = wrapper(&mut store, "java.lang.Boolean", false);
        let byte = wrapper(&mut store, "java.lang.Byte", true);
        let short = wrapper(&mut store, "java.lang.Short", true);
        let integer = wrapper(&mut store, "java.lang.Integer", true);
        let long = wrapper(&mut store, "java.lang.Long", true);
        let character = wrapper(&mut store, "java.lang.Character", false);
        let float = wrapper(&mut store, "java.lang.Float", true);
        let double = wrapper(&mut store, "java.lang.Double", true);

        // A few collection interfaces, used pervasively by tests and by the
        // deployments this crate models.
        let iterable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let iterable = store.add_class(ClassDef {
            name: "java.lang.Iterable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![iterable_t],
            super_class: None,
            interfaces: vec![],
        });

        let collection_t = store.add_type_param("E", vec![object_ty.clone()]);
        let collection = store.add_class(ClassDef {
            name: "java.util.Collection".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![collection_t],
            super_class: None,
            interfaces: vec![Type::class(iterable, vec![Type::TypeVar(collection_t)])],
        });

        let list_e = store.add_type_param("E", vec![object_ty.clone()]);
        let list = store.add_class(ClassDef {
            name: "java.util.List".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![list_e],
            super_class: None,
            interfaces: vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
        });

        let array_list_e = store.add_type_param("E", vec![object_ty.clone()]);
        store.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            kind: ClassKind::Class,
            type_params: vec![array_list_e],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(list, vec![Type::TypeVar(array_list_e)])],
        });

        let map_k = store.add_type_param("K", vec![object_ty.clone()]);
        let map_v = store.add_type_param("V", vec![object_ty.clone()]);
        let map = store.add_class(ClassDef {
            name: "java.util.Map".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![map_k, map_v],
            super_class: None,
            interfaces: vec![],
        });

        let hash_map_k = store.add_type_param("K", vec![object_ty.clone()]);
        let hash_map_v = store.add_type_param("V", vec![object_ty.clone()]);
        store.add_class(ClassDef {
            name: "java.util.HashMap".to_string(),
            kind: ClassKind::Class,
            type_params: vec![hash_map_k, hash_map_v],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(
                map,
                vec![Type::TypeVar(hash_map_k), Type::TypeVar(hash_map_v)],
            )],
        });

        store.add_interface("java.lang.Runnable", vec![]);

        store.well_known = WellKnownTypes {
            object,
            cloneable,
            serializable,
            char_sequence,
            string,
            number,
            comparable,
            boolean,
            byte,
            short,
            integer,
            long,
            character,
            float,
            double,
        };
        store
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(u32::try_from(self.classes.len()).expect("too many classes"));
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(u32::try_from(self.type_params.len()).expect("too many type params"));
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
        });
        id
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn add_root_class(&mut self, name: &str, kind: ClassKind) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
        })
    }

    fn add_interface(&mut self, name: &str, interfaces: Vec<Type>) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: None,
            interfaces,
        })
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}

/// Apply a type-variable substitution.
pub fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ct) => Type::class(
            ct.def,
            ct.args.iter().map(|a| substitute(a, subst)).collect(),
        ),
        Type::Array(component) => Type::array(substitute(component, subst)),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(upper, subst))))
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(lower, subst))))
        }
        Type::Wildcard(WildcardBound::Unbounded) | Type::Primitive(_) => ty.clone(),
    }
}

/// Primitive-to-wrapper widening, applied once at the top of every
/// assignability check.
pub fn boxed(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Primitive(p) => Type::class(env.well_known().wrapper_of(*p), vec![]),
        other => other.clone(),
    }
}

/// The upper bounds of a type variable, defaulting to `Object` when the
/// declaration is unbounded or unknown.
pub fn upper_bounds_or_object(env: &dyn TypeEnv, id: TypeVarId) -> Vec<Type> {
    let bounds = env
        .type_param(id)
        .map(|tp| tp.upper_bounds.clone())
        .unwrap_or_default();
    if bounds.is_empty() {
        vec![Type::class(env.well_known().object, vec![])]
    } else {
        bounds
    }
}

/// True for `Object` and for type variables bounded only by `Object` (or
/// unbounded). Raw-vs-parameterized matching hinges on this predicate.
pub fn is_unbounded_type_var_or_object(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::Class(ct) => ct.def == env.well_known().object && ct.args.is_empty(),
        Type::TypeVar(id) => upper_bounds_or_object(env, *id)
            .iter()
            .all(|b| is_unbounded_type_var_or_object(env, b)),
        _ => false,
    }
}

/// Render a type for error messages, e.g. `java.util.List<java.lang.String>`.
pub fn display(env: &dyn TypeEnv, ty: &Type) -> String {
    #[derive(Clone, Copy)]
    struct D<'a>(&'a dyn TypeEnv, &'a Type);
    impl fmt::Display for D<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let D(env, ty) = *self;
            match ty {
                Type::Primitive(p) => write!(f, "{}", p.name()),
                Type::Array(component) => write!(f, "{}[]", D(env, component)),
                Type::TypeVar(id) => match env.type_param(*id) {
                    Some(tp) => write!(f, "{}", tp.name),
                    None => write!(f, "T#{}", id.0),
                },
                Type::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
                Type::Wildcard(WildcardBound::Extends(upper)) => {
                    write!(f, "? extends {}", D(env, upper))
                }
                Type::Wildcard(WildcardBound::Super(lower)) => {
                    write!(f, "? super {}", D(env, lower))
                }
                Type::Class(ct) => {
                    match env.class(ct.def) {
                        Some(def) => write!(f, "{}", def.name)?,
                        None => write!(f, "class#{}", ct.def.0)?,
                    }
                    if !ct.args.is_empty() {
                        write!(f, "<")?;
                        for (i, arg) in ct.args.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", D(env, arg))?;
                        }
                        write!(f, ">")?;
                    }
                    Ok(())
                }
            }
        }
    }
    D(env, ty).to_string()
}
