//! Annotation declarations and values as the scanner reports them.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index of an annotation declaration in an [`AnnotationStore`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AnnotationTypeId(pub u32);

/// `jakarta.enterprise.inject.Any`, present on every bean.
pub const ANY: AnnotationTypeId = AnnotationTypeId(0);
/// `jakarta.enterprise.inject.Default`, injected by normalization.
pub const DEFAULT: AnnotationTypeId = AnnotationTypeId(1);
/// `jakarta.inject.Named`; its `value` member is always binding.
pub const NAMED: AnnotationTypeId = AnnotationTypeId(2);
/// `jakarta.enterprise.inject.Alternative` (meta-annotation on stereotypes).
pub const ALTERNATIVE: AnnotationTypeId = AnnotationTypeId(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Qualifier,
    InterceptorBinding,
    Stereotype,
    Scope,
    /// Any other annotation; carried around but never matched on.
    Plain,
}

/// A member (attribute) of an annotation declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationMember {
    pub name: String,
    /// Marked `@Nonbinding`: excluded from qualifier and interceptor-binding
    /// equality.
    pub nonbinding: bool,
    /// Default value, used when an instance omits the member.
    pub default: Option<AnnotationValue>,
}

impl AnnotationMember {
    pub fn binding(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nonbinding: false,
            default: None,
        }
    }

    pub fn nonbinding(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nonbinding: true,
            default: None,
        }
    }

    pub fn with_default(mut self, default: AnnotationValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// An annotation declaration: name, kind, members, and the meta-annotations
/// present on the declaration itself (the source of inherited interceptor
/// bindings and of stereotype contents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDecl {
    pub name: String,
    pub kind: AnnotationKind,
    pub members: Vec<AnnotationMember>,
    pub meta: Vec<RawAnnotation>,
    /// `@Repeatable` declarations bypass same-type conflict detection.
    pub repeatable: bool,
}

impl AnnotationDecl {
    pub fn new(name: &str, kind: AnnotationKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            members: Vec::new(),
            meta: Vec::new(),
            repeatable: false,
        }
    }

    pub fn with_members(mut self, members: Vec<AnnotationMember>) -> Self {
        self.members = members;
        self
    }

    pub fn with_meta(mut self, meta: Vec<RawAnnotation>) -> Self {
        self.meta = meta;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn member(&self, name: &str) -> Option<&AnnotationMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A deep-equality member value tree.
///
/// Floating-point members are stored by IEEE bit pattern, which reproduces
/// Java annotation equality (`NaN` members compare equal to themselves).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    FloatBits(u64),
    Str(String),
    EnumConst { enum_type: String, constant: String },
    ClassRef(String),
    Nested(Box<RawAnnotation>),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    pub fn float(value: f64) -> Self {
        AnnotationValue::FloatBits(value.to_bits())
    }

    pub fn string(value: &str) -> Self {
        AnnotationValue::Str(value.to_string())
    }
}

/// An annotation instance as written on a class, stereotype, or injection
/// point. Omitted members fall back to the declaration's defaults.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RawAnnotation {
    pub decl: AnnotationTypeId,
    pub values: BTreeMap<String, AnnotationValue>,
}

impl RawAnnotation {
    pub fn marker(decl: AnnotationTypeId) -> Self {
        Self {
            decl,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(decl: AnnotationTypeId, member: &str, value: AnnotationValue) -> Self {
        let mut values = BTreeMap::new();
        values.insert(member.to_string(), value);
        Self { decl, values }
    }

    /// Shorthand for `@Named("...")`.
    pub fn named(name: &str) -> Self {
        Self::with_value(NAMED, "value", AnnotationValue::string(name))
    }
}

/// All annotation declarations known to a deployment.
///
/// Mutated only while the scanner feeds the deployment; read-only during
/// resolution. The CDI built-ins occupy fixed ids.
#[derive(Debug)]
pub struct AnnotationStore {
    decls: Vec<AnnotationDecl>,
    by_name: HashMap<String, AnnotationTypeId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        let mut store = Self {
            decls: Vec::new(),
            by_name: HashMap::new(),
        };
        let any = store.add(AnnotationDecl::new(
            "jakarta.enterprise.inject.Any",
            AnnotationKind::Qualifier,
        ));
        let default = store.add(AnnotationDecl::new(
            "jakarta.enterprise.inject.Default",
            AnnotationKind::Qualifier,
        ));
        let named = store.add(
            AnnotationDecl::new("jakarta.inject.Named", AnnotationKind::Qualifier).with_members(
                vec![AnnotationMember::binding("value")
                    .with_default(AnnotationValue::string(""))],
            ),
        );
        let alternative = store.add(AnnotationDecl::new(
            "jakarta.enterprise.inject.Alternative",
            AnnotationKind::Plain,
        ));
        debug_assert_eq!((any, default, named, alternative), (ANY, DEFAULT, NAMED, ALTERNATIVE));
        store
    }

    pub fn add(&mut self, decl: AnnotationDecl) -> AnnotationTypeId {
        let id = AnnotationTypeId(u32::try_from(self.decls.len()).expect("too many annotations"));
        self.by_name.insert(decl.name.clone(), id);
        self.decls.push(decl);
        id
    }

    pub fn decl(&self, id: AnnotationTypeId) -> Option<&AnnotationDecl> {
        self.decls.get(id.0 as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<AnnotationTypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: AnnotationTypeId) -> &str {
        self.decl(id).map_or("<unknown annotation>", |d| &d.name)
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
