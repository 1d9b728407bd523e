//! Plain covariant assignability.
//!
//! This is the relation wildcard and type-variable bounds are checked
//! against: ordinary Java widening over the class hierarchy, with invariant
//! type arguments except where a wildcard appears in the required position.
//! The stricter bean-type matching in [`crate::bean_rules`] delegates here
//! for every bound check.

use crate::{
    boxed, closure::instantiate_as_supertype, upper_bounds_or_object, ClassType, Type, TypeEnv,
    WildcardBound,
};

/// Is a value of type `other` usable where `required` is expected?
pub fn is_assignable_from(env: &dyn TypeEnv, required: &Type, other: &Type) -> bool {
    let required = boxed(env, required);
    let other = boxed(env, other);
    assignable(env, &required, &other)
}

/// `t1` is strictly more specific than `t2`: distinct types with `t2`
/// covariantly assignable from `t1`. Specialization checks use this.
pub fn is_more_specific(env: &dyn TypeEnv, t1: &Type, t2: &Type) -> bool {
    t1 != t2 && is_assignable_from(env, t2, t1)
}

fn assignable(env: &dyn TypeEnv, required: &Type, other: &Type) -> bool {
    match (required, other) {
        (Type::Wildcard(w), _) => wildcard_contains(env, w, other),
        (_, Type::Wildcard(w)) => match w {
            // Anything the upper bound widens to is reachable through the
            // wildcard.
            WildcardBound::Extends(upper) => assignable(env, required, upper),
            WildcardBound::Unbounded | WildcardBound::Super(_) => {
                is_object(env, required)
            }
        },
        (Type::TypeVar(r), Type::TypeVar(o)) => {
            if r == o {
                return true;
            }
            // The required variable's bounds must be entailed by the other
            // variable's bounds.
            let other_bounds = upper_bounds_or_object(env, *o);
            upper_bounds_or_object(env, *r)
                .iter()
                .all(|rb| other_bounds.iter().any(|ob| assignable(env, rb, ob)))
        }
        (Type::TypeVar(_), _) => false,
        (_, Type::TypeVar(o)) => upper_bounds_or_object(env, *o)
            .iter()
            .any(|bound| assignable(env, required, bound)),
        (Type::Array(rc), Type::Array(oc)) => match (rc.as_ref(), oc.as_ref()) {
            (Type::Primitive(rp), Type::Primitive(op)) => rp == op,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (rc, oc) => is_assignable_from(env, rc, oc),
        },
        (Type::Class(r), Type::Array(_)) => {
            let wk = env.well_known();
            r.args.is_empty()
                && (r.def == wk.object || r.def == wk.cloneable || r.def == wk.serializable)
        }
        (Type::Class(r), Type::Class(_)) => class_assignable(env, r, other),
        (Type::Primitive(rp), Type::Primitive(op)) => rp == op,
        _ => false,
    }
}

fn class_assignable(env: &dyn TypeEnv, required: &ClassType, other: &Type) -> bool {
    let Some(Type::Class(sup)) = instantiate_as_supertype(env, other, required.def) else {
        return false;
    };

    if required.args.is_empty() {
        // A raw required type accepts any instantiation of itself or a
        // subtype.
        return true;
    }
    if sup.args.is_empty() {
        // The supertype view stayed raw, i.e. `other` used a generic class
        // rawly. Unchecked conversion makes this assignable to any
        // instantiation; a non-generic class can never reach a parameterized
        // required type.
        return env
            .class(required.def)
            .is_some_and(|def| !def.type_params.is_empty());
    }
    if required.args.len() != sup.args.len() {
        return false;
    }
    required
        .args
        .iter()
        .zip(&sup.args)
        .all(|(ra, oa)| argument_contains(env, ra, oa))
}

/// Type-argument containment: identical, or a required-side wildcard whose
/// bounds admit the other argument.
fn argument_contains(env: &dyn TypeEnv, required: &Type, other: &Type) -> bool {
    match required {
        Type::Wildcard(w) => wildcard_contains(env, w, other),
        _ => required == other,
    }
}

fn wildcard_contains(env: &dyn TypeEnv, wildcard: &WildcardBound, other: &Type) -> bool {
    match wildcard {
        WildcardBound::Unbounded => true,
        WildcardBound::Extends(upper) => assignable(env, upper, other),
        WildcardBound::Super(lower) => assignable(env, other, lower),
    }
}

fn is_object(env: &dyn TypeEnv, ty: &Type) -> bool {
    matches!(ty, Type::Class(ct) if ct.def == env.well_known().object && ct.args.is_empty())
}
