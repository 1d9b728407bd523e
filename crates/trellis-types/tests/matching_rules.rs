//! Cross-module matching properties: the bean rules, event rules, and plain
//! covariant assignability agree on wildcards and diverge on raw types and
//! invariance in known, pinned-down ways.

use trellis_types::{
    bean_rules, covariant, event_rules, type_closure, Type, TypeEnv, TypeStore, WildcardBound,
};

use pretty_assertions::assert_eq;

#[test]
fn closure_plus_bean_rules_gives_hierarchy_widening() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let list = store.class_id("java.util.List").unwrap();

    let string = Type::class(wk.string, vec![]);
    let bean_types = type_closure(&store, &Type::class(array_list, vec![string.clone()]));

    let required = Type::class(list, vec![string.clone()]);
    assert!(bean_rules::matches_any(&store, &required, &bean_types));

    let required_object_list = Type::class(list, vec![Type::class(wk.object, vec![])]);
    assert!(!bean_rules::matches_any(
        &store,
        &required_object_list,
        &bean_types
    ));
}

#[test]
fn invariant_versus_covariant_divergence() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list = store.class_id("java.util.List").unwrap();
    let number = Type::class(wk.number, vec![]);
    let integer = Type::class(wk.integer, vec![]);

    let list_number = Type::class(list, vec![number.clone()]);
    let list_integer = Type::class(list, vec![integer.clone()]);
    let list_ext_number = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(
            number.clone(),
        )))],
    );

    // Without a wildcard every relation is invariant in the argument.
    assert!(!bean_rules::matches(&store, &list_number, &list_integer));
    assert!(!event_rules::matches(&store, &list_number, &list_integer));
    assert!(!covariant::is_assignable_from(
        &store,
        &list_number,
        &list_integer
    ));

    // With a wildcard all three admit the narrower argument.
    assert!(bean_rules::matches(&store, &list_ext_number, &list_integer));
    assert!(event_rules::matches(&store, &list_ext_number, &list_integer));
    assert!(covariant::is_assignable_from(
        &store,
        &list_ext_number,
        &list_integer
    ));
}

#[test]
fn raw_bean_type_versus_raw_event_type() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list = store.class_id("java.util.List").unwrap();
    let raw_list = Type::class(list, vec![]);
    let list_string = Type::class(list, vec![Type::class(wk.string, vec![])]);

    // A raw-typed bean satisfies any instantiation; a raw observed type
    // receives any instantiation. Symmetric here, asymmetric below.
    assert!(bean_rules::matches(&store, &list_string, &raw_list));
    assert!(event_rules::matches(&store, &raw_list, &list_string));

    // A parameterized requirement with a non-Object argument is not served
    // by a parameterized bean of a different argument, raw or not.
    assert!(!bean_rules::matches(&store, &raw_list, &list_string));
}

#[test]
fn closures_are_stable_under_repetition() {
    let store = TypeStore::with_minimal_jdk();
    let hash_map = store.class_id("java.util.HashMap").unwrap();
    let wk = store.well_known().clone();
    let string = Type::class(wk.string, vec![]);
    let integer = Type::class(wk.integer, vec![]);

    let ty = Type::class(hash_map, vec![string, integer]);
    assert_eq!(type_closure(&store, &ty), type_closure(&store, &ty));
}
