//! Observer resolution matching.
//!
//! Looser than [`crate::bean_rules`]: an observed type with a wildcard or
//! type-variable argument accepts covariant widening of the event type's
//! argument, and a raw observed type accepts every instantiation. Event
//! types are runtime types and therefore never contain wildcards
//! themselves, but observed types routinely do.

use crate::{boxed, closure::instantiate_as_supertype, upper_bounds_or_object, ClassType, Type,
    TypeEnv, TypeVarId, WildcardBound};

/// Does an event of type `event_type` (one element of the event's type
/// closure) reach an observer of `observed`?
pub fn matches(env: &dyn TypeEnv, observed: &Type, event_type: &Type) -> bool {
    matches_no_boxing(env, &boxed(env, observed), &boxed(env, event_type))
}

/// Does any element of `event_types` reach an observer of `observed`?
pub fn matches_any<'a>(
    env: &dyn TypeEnv,
    observed: &Type,
    event_types: impl IntoIterator<Item = &'a Type>,
) -> bool {
    event_types.into_iter().any(|ty| matches(env, observed, ty))
}

fn matches_no_boxing(env: &dyn TypeEnv, observed: &Type, event: &Type) -> bool {
    match (observed, event) {
        // Boxing never applies below the top level.
        (Type::Array(oc), Type::Array(ec)) => matches_no_boxing(env, oc, ec),
        (Type::Wildcard(w), _) => inside_wildcard(env, w, event),
        (Type::TypeVar(tv), _) => inside_var_bounds(env, *tv, event),
        (o, Type::TypeVar(tv)) if o.is_actual() => {
            // The observed type must sit within the event variable's bounds.
            upper_bounds_or_object(env, *tv)
                .iter()
                .any(|bound| assignable(env, bound, o))
        }
        (o, Type::Wildcard(w)) if o.is_actual() => match w {
            WildcardBound::Extends(upper) => matches_no_boxing(env, o, upper),
            WildcardBound::Unbounded | WildcardBound::Super(_) => {
                matches_no_boxing(env, o, &Type::class(env.well_known().object, vec![]))
            }
        },
        (Type::Class(o), Type::Class(e)) => {
            o.def == e.def && arguments_match(env, o, e)
        }
        (Type::Primitive(op), Type::Primitive(ep)) => op == ep,
        _ => false,
    }
}

/// Observed arguments are matched positionally; a missing event argument
/// (raw event type) is treated as `Object`.
fn arguments_match(env: &dyn TypeEnv, observed: &ClassType, event: &ClassType) -> bool {
    let object = Type::class(env.well_known().object, vec![]);
    observed.args.iter().enumerate().all(|(i, oa)| {
        let ea = event.args.get(i).unwrap_or(&object);
        matches_no_boxing(env, oa, ea)
    })
}

fn inside_wildcard(env: &dyn TypeEnv, wildcard: &WildcardBound, ty: &Type) -> bool {
    match wildcard {
        WildcardBound::Unbounded => true,
        WildcardBound::Extends(upper) => assignable(env, upper, ty),
        WildcardBound::Super(lower) => assignable(env, ty, lower),
    }
}

fn inside_var_bounds(env: &dyn TypeEnv, tv: TypeVarId, ty: &Type) -> bool {
    upper_bounds_or_object(env, tv)
        .iter()
        .any(|bound| assignable(env, bound, ty))
}

/// The covariant relation observer bounds are checked against. Unlike
/// [`crate::covariant::is_assignable_from`], type arguments here widen
/// covariantly as well.
fn assignable(env: &dyn TypeEnv, required: &Type, other: &Type) -> bool {
    let required = boxed(env, required);
    let other = boxed(env, other);
    match (&required, &other) {
        (Type::Wildcard(w), _) => inside_wildcard(env, w, &other),
        (Type::TypeVar(tv), _) => inside_var_bounds(env, *tv, &other),
        (r, Type::TypeVar(tv)) => upper_bounds_or_object(env, *tv)
            .iter()
            .all(|bound| assignable(env, bound, r)),
        (r, Type::Wildcard(w)) => match w {
            WildcardBound::Extends(upper) => assignable(env, r, upper),
            WildcardBound::Unbounded | WildcardBound::Super(_) => {
                assignable(env, r, &Type::class(env.well_known().object, vec![]))
            }
        },
        (Type::Array(rc), Type::Array(oc)) => match (rc.as_ref(), oc.as_ref()) {
            (Type::Primitive(rp), Type::Primitive(op)) => rp == op,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (rc, oc) => assignable(env, rc, oc),
        },
        (Type::Class(r), _) => {
            let Some(Type::Class(sup)) = instantiate_as_supertype(env, &other, r.def) else {
                return false;
            };
            let object = Type::class(env.well_known().object, vec![]);
            r.args.iter().enumerate().all(|(i, ra)| {
                let oa = sup.args.get(i).unwrap_or(&object);
                assignable(env, ra, oa)
            })
        }
        (Type::Primitive(rp), Type::Primitive(op)) => rp == op,
        _ => false,
    }
}
