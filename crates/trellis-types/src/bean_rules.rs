//! Type-safe resolution matching for injection points.
//!
//! This is deliberately not ordinary Java assignability. A required type is
//! matched against one element of a bean's type closure at a time, so the
//! predicate itself demands identical classes; hierarchy widening happens
//! through the closure. Type arguments are invariant, with wildcard and
//! type-variable positions checked against their bounds via
//! [`crate::covariant`].

use crate::{
    boxed, covariant, is_unbounded_type_var_or_object, upper_bounds_or_object, ClassType, Type,
    TypeEnv, WildcardBound,
};

/// Does `bean_type` (one element of a bean's type closure) satisfy
/// `required`?
pub fn matches(env: &dyn TypeEnv, required: &Type, bean_type: &Type) -> bool {
    matches_no_boxing(env, &boxed(env, required), &boxed(env, bean_type))
}

/// Does any element of `bean_types` satisfy `required`?
pub fn matches_any<'a>(
    env: &dyn TypeEnv,
    required: &Type,
    bean_types: impl IntoIterator<Item = &'a Type>,
) -> bool {
    bean_types
        .into_iter()
        .any(|bean_type| matches(env, required, bean_type))
}

fn matches_no_boxing(env: &dyn TypeEnv, required: &Type, bean_type: &Type) -> bool {
    match (required, bean_type) {
        // Boxing never applies below the top level: int[] and Integer[] are
        // distinct types.
        (Type::Array(rc), Type::Array(bc)) => matches_no_boxing(env, rc, bc),
        (Type::Class(r), Type::Class(b)) => classes_match(env, r, b),
        (Type::Primitive(rp), Type::Primitive(bp)) => rp == bp,
        // Type variables and wildcards are not legal at the top level of
        // either side; resolvable construction rejects them.
        _ => false,
    }
}

fn classes_match(env: &dyn TypeEnv, required: &ClassType, bean: &ClassType) -> bool {
    if required.def != bean.def {
        return false;
    }
    match (required.args.is_empty(), bean.args.is_empty()) {
        (true, true) => true,
        // A parameterized bean type satisfies a raw required type only when
        // every argument is an unbounded type variable or Object.
        (true, false) => bean
            .args
            .iter()
            .all(|arg| is_unbounded_type_var_or_object(env, arg)),
        // A raw bean type satisfies any instantiation of its class.
        (false, true) => env
            .class(required.def)
            .is_some_and(|def| !def.type_params.is_empty()),
        (false, false) => {
            if required.args.len() != bean.args.len() {
                debug_assert!(false, "type argument arity mismatch survived registration");
                return false;
            }
            required
                .args
                .iter()
                .zip(&bean.args)
                .all(|(ra, ba)| parameters_match(env, ra, ba))
        }
    }
}

fn parameters_match(env: &dyn TypeEnv, required: &Type, bean: &Type) -> bool {
    match (required, bean) {
        // Both actual: identical raw type, arguments matched by these same
        // rules, invariant all the way down.
        (r, b) if r.is_actual() && b.is_actual() => matches_no_boxing(env, r, b),
        (Type::Wildcard(w), b) if b.is_actual() => wildcard_matches_actual(env, w, b),
        (Type::Wildcard(w), Type::TypeVar(b)) => wildcard_matches_type_var(env, w, *b),
        (r, Type::TypeVar(b)) if r.is_actual() => actual_matches_type_var(env, r, *b),
        (Type::TypeVar(r), Type::TypeVar(b)) => type_vars_match(env, *r, *b),
        _ => false,
    }
}

/// The bean argument must sit within the wildcard's bounds.
fn wildcard_matches_actual(env: &dyn TypeEnv, wildcard: &WildcardBound, bean: &Type) -> bool {
    match wildcard {
        WildcardBound::Unbounded => true,
        WildcardBound::Extends(upper) => covariant::is_assignable_from(env, upper, bean),
        WildcardBound::Super(lower) => covariant::is_assignable_from(env, bean, lower),
    }
}

/// Every upper bound of the bean's variable must be compatible with the
/// wildcard: assignable to or from its upper bound, and above its lower
/// bound if one exists.
fn wildcard_matches_type_var(env: &dyn TypeEnv, wildcard: &WildcardBound, bean: crate::TypeVarId) -> bool {
    let object = Type::class(env.well_known().object, vec![]);
    let (upper, lower) = match wildcard {
        WildcardBound::Unbounded => (object, None),
        WildcardBound::Extends(u) => ((**u).clone(), None),
        WildcardBound::Super(l) => (object, Some((**l).clone())),
    };
    upper_bounds_or_object(env, bean).iter().all(|bound| {
        let upper_compatible = covariant::is_assignable_from(env, bound, &upper)
            || covariant::is_assignable_from(env, &upper, bound);
        let lower_compatible = lower
            .as_ref()
            .map_or(true, |l| covariant::is_assignable_from(env, bound, l));
        upper_compatible && lower_compatible
    })
}

/// The required actual type must be assignable to every upper bound of the
/// bean's variable. Bounds that are themselves type variables recurse
/// through these rules; any other bound uses covariant assignability.
fn actual_matches_type_var(env: &dyn TypeEnv, required: &Type, bean: crate::TypeVarId) -> bool {
    upper_bounds_or_object(env, bean)
        .iter()
        .all(|bound| match bound {
            Type::TypeVar(nested) => actual_matches_type_var(env, required, *nested),
            other => covariant::is_assignable_from(env, other, required),
        })
}

/// Every upper bound of the required variable must be assignable to every
/// upper bound of the bean's variable.
fn type_vars_match(env: &dyn TypeEnv, required: crate::TypeVarId, bean: crate::TypeVarId) -> bool {
    let bean_bounds = upper_bounds_or_object(env, bean);
    upper_bounds_or_object(env, required).iter().all(|rb| {
        bean_bounds
            .iter()
            .all(|bb| covariant::is_assignable_from(env, bb, rb))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrimitiveType, TypeStore};

    fn wildcard_extends(upper: Type) -> Type {
        Type::Wildcard(WildcardBound::Extends(Box::new(upper)))
    }

    fn wildcard_super(lower: Type) -> Type {
        Type::Wildcard(WildcardBound::Super(Box::new(lower)))
    }

    #[test]
    fn identical_raw_types_match() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let string = Type::class(wk.string, vec![]);
        let number = Type::class(wk.number, vec![]);
        let integer = Type::class(wk.integer, vec![]);

        assert!(matches(&store, &string, &string));
        // Widening happens through the bean's type closure, never inside the
        // predicate.
        assert!(!matches(&store, &number, &integer));
    }

    #[test]
    fn boxing_makes_primitives_and_wrappers_interchangeable() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let int = Type::Primitive(PrimitiveType::Int);
        let integer = Type::class(wk.integer, vec![]);
        assert!(matches(&store, &int, &integer));
        assert!(matches(&store, &integer, &int));
        assert!(!matches(&store, &int, &Type::class(wk.long, vec![])));
    }

    #[test]
    fn parameterized_arguments_are_invariant() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let list_of = |arg: Type| Type::class(list, vec![arg]);
        let string = Type::class(wk.string, vec![]);
        let object = Type::class(wk.object, vec![]);

        assert!(matches(&store, &list_of(string.clone()), &list_of(string.clone())));
        assert!(!matches(&store, &list_of(object.clone()), &list_of(string.clone())));
        assert!(!matches(&store, &list_of(string.clone()), &list_of(object.clone())));
    }

    #[test]
    fn raw_bean_type_satisfies_any_instantiation() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let raw_list = Type::class(list, vec![]);
        let list_string = Type::class(list, vec![Type::class(wk.string, vec![])]);

        assert!(matches(&store, &list_string, &raw_list));
        // A non-generic class can never satisfy a parameterized requirement.
        let bogus = Type::class(wk.string, vec![Type::class(wk.object, vec![])]);
        assert!(!matches(&store, &bogus, &Type::class(wk.string, vec![])));
    }

    #[test]
    fn parameterized_bean_satisfies_raw_requirement_only_when_erased() {
        let mut store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let raw_list = Type::class(list, vec![]);
        let object = Type::class(wk.object, vec![]);
        let string = Type::class(wk.string, vec![]);

        assert!(matches(&store, &raw_list, &Type::class(list, vec![object])));
        let unbounded = store.add_type_param("T", vec![]);
        assert!(matches(
            &store,
            &raw_list,
            &Type::class(list, vec![Type::TypeVar(unbounded)])
        ));
        assert!(!matches(&store, &raw_list, &Type::class(list, vec![string])));
    }

    #[test]
    fn wildcard_requirements_check_bounds() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let list_of = |arg: Type| Type::class(list, vec![arg]);
        let number = Type::class(wk.number, vec![]);
        let integer = Type::class(wk.integer, vec![]);
        let string = Type::class(wk.string, vec![]);

        assert!(matches(
            &store,
            &list_of(wildcard_extends(number.clone())),
            &list_of(integer.clone())
        ));
        assert!(!matches(
            &store,
            &list_of(wildcard_extends(integer.clone())),
            &list_of(number.clone())
        ));
        assert!(!matches(
            &store,
            &list_of(wildcard_extends(number.clone())),
            &list_of(string.clone())
        ));
        assert!(matches(
            &store,
            &list_of(wildcard_super(integer.clone())),
            &list_of(number.clone())
        ));
        assert!(!matches(
            &store,
            &list_of(wildcard_super(number.clone())),
            &list_of(integer.clone())
        ));
        assert!(matches(
            &store,
            &list_of(Type::Wildcard(WildcardBound::Unbounded)),
            &list_of(string)
        ));
    }

    #[test]
    fn type_variable_bean_arguments_check_bounds() {
        let mut store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let list_of = |arg: Type| Type::class(list, vec![arg]);
        let number = Type::class(wk.number, vec![]);
        let integer = Type::class(wk.integer, vec![]);
        let string = Type::class(wk.string, vec![]);

        let bounded = store.add_type_param("T", vec![number.clone()]);

        // Required actual within the variable's bound.
        assert!(matches(
            &store,
            &list_of(integer.clone()),
            &list_of(Type::TypeVar(bounded))
        ));
        assert!(!matches(
            &store,
            &list_of(string.clone()),
            &list_of(Type::TypeVar(bounded))
        ));

        // Wildcard vs. type variable: bounds must be mutually compatible.
        assert!(matches(
            &store,
            &list_of(wildcard_extends(integer.clone())),
            &list_of(Type::TypeVar(bounded))
        ));
        assert!(!matches(
            &store,
            &list_of(wildcard_extends(string.clone())),
            &list_of(Type::TypeVar(bounded))
        ));

        // Variable vs. variable: required bound must reach the bean's bound.
        let required_var = store.add_type_param("R", vec![integer.clone()]);
        let weaker_var = store.add_type_param("W", vec![number.clone()]);
        assert!(matches(
            &store,
            &list_of(Type::TypeVar(required_var)),
            &list_of(Type::TypeVar(weaker_var))
        ));
        assert!(!matches(
            &store,
            &list_of(Type::TypeVar(weaker_var)),
            &list_of(Type::TypeVar(required_var))
        ));

        // A required type variable never matches an actual bean argument.
        assert!(!matches(
            &store,
            &list_of(Type::TypeVar(required_var)),
            &list_of(integer.clone())
        ));
    }

    #[test]
    fn arrays_recurse_on_components() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let strings = Type::array(Type::class(wk.string, vec![]));
        let numbers = Type::array(Type::class(wk.number, vec![]));
        let ints = Type::array(Type::Primitive(PrimitiveType::Int));
        let integers = Type::array(Type::class(wk.integer, vec![]));

        assert!(matches(&store, &strings, &strings));
        assert!(matches(&store, &ints, &ints));
        assert!(!matches(&store, &numbers, &integers));
        // Boxing never applies to array components.
        assert!(!matches(&store, &ints, &integers));
    }

    #[test]
    fn assignability_is_reflexive_for_well_formed_bean_types() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let samples = [
            Type::class(wk.string, vec![]),
            Type::class(list, vec![Type::class(wk.integer, vec![])]),
            Type::class(list, vec![]),
            Type::array(Type::class(wk.string, vec![])),
            Type::Primitive(PrimitiveType::Double),
        ];
        for ty in &samples {
            assert!(matches(&store, ty, ty), "not reflexive: {ty:?}");
        }
    }
}
