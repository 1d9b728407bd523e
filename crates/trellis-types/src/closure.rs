//! Type closure: the set of types a declared type can be injected as.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{substitute, ClassKind, ClassType, Type, TypeEnv, TypeVarId};

/// Return the full set of bean types of `ty`: the type itself plus every
/// superclass and superinterface with type-argument substitution applied
/// along the way.
///
/// Raw instantiations stay raw while walking (`HashMap` contributes `Map`,
/// not `Map<K, V>`). The result is deterministic: breadth-first from the
/// input with interface edges visited in class-name order, and `Object`
/// always present for class and array types.
pub fn type_closure(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let object = Type::class(env.well_known().object, vec![]);
    match ty {
        Type::Class(_) => class_closure(env, ty),
        Type::Array(_) => vec![
            ty.clone(),
            Type::class(env.well_known().cloneable, vec![]),
            Type::class(env.well_known().serializable, vec![]),
            object,
        ],
        // Primitives resolve through their wrapper; the wrapper's closure is
        // the bean type set.
        Type::Primitive(_) => {
            let mut out = vec![ty.clone()];
            out.extend(class_closure(env, &crate::boxed(env, ty)));
            out
        }
        // Type variables and wildcards are rejected as declared bean types at
        // registration; their closure is just themselves.
        Type::TypeVar(_) | Type::Wildcard(_) => vec![ty.clone()],
    }
}

/// View `ty` as an instantiation of `target` by walking the supertype graph,
/// or `None` if `target` is not a supertype.
///
/// Example: `ArrayList<String>` viewed as `List` yields `List<String>`;
/// a raw `ArrayList` viewed as `List` yields the raw `List`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: crate::ClassId) -> Option<Type> {
    if let Type::Array(_) = ty {
        let wk = env.well_known();
        if target == wk.object || target == wk.cloneable || target == wk.serializable {
            return Some(Type::class(target, vec![]));
        }
        return None;
    }
    class_closure(env, ty)
        .into_iter()
        .find(|sup| sup.raw_class() == Some(target))
}

fn class_closure(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let Type::Class(ClassType { def, args }) = ty else {
        return vec![ty.clone()];
    };

    let mut out: Vec<Type> = Vec::new();
    let mut seen: HashSet<Type> = HashSet::new();
    let mut queue: VecDeque<Type> = VecDeque::new();
    queue.push_back(Type::class(*def, args.clone()));

    let mut saw_interface = false;

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current.clone() else {
            continue;
        };
        if !seen.insert(current.clone()) {
            continue;
        }
        out.push(current);

        let Some(class_def) = env.class(def) else {
            continue;
        };
        if class_def.kind == ClassKind::Interface {
            saw_interface = true;
        }

        // A raw instantiation of a generic definition cannot recover type
        // arguments for its supertypes; preserve rawness when walking.
        let raw = args.is_empty() && !class_def.type_params.is_empty();

        let subst: HashMap<TypeVarId, Type> = if raw {
            HashMap::new()
        } else {
            class_def
                .type_params
                .iter()
                .copied()
                .zip(args.iter().cloned())
                .collect()
        };

        let apply = |sup: &Type| -> Option<Type> {
            let ct = match sup {
                Type::Class(ct) => ct,
                _ => return None,
            };
            if raw {
                Some(Type::class(ct.def, vec![]))
            } else {
                Some(substitute(sup, &subst))
            }
        };

        if let Some(sc) = class_def.super_class.as_ref().and_then(&apply) {
            queue.push_back(sc);
        }

        let mut interfaces: Vec<Type> = class_def.interfaces.iter().filter_map(&apply).collect();
        interfaces.sort_by_cached_key(|iface| {
            iface
                .raw_class()
                .and_then(|id| env.class(id))
                .map(|def| def.name.clone())
                .unwrap_or_default()
        });
        queue.extend(interfaces);
    }

    // Interfaces have no superclass edge to Object; add it explicitly.
    let object = Type::class(env.well_known().object, vec![]);
    if saw_interface && !seen.contains(&object) {
        out.push(object);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypeStore, WildcardBound};
    use pretty_assertions::assert_eq;

    #[test]
    fn closure_substitutes_type_arguments() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let array_list = store.class_id("java.util.ArrayList").unwrap();
        let list = store.class_id("java.util.List").unwrap();
        let collection = store.class_id("java.util.Collection").unwrap();

        let string = Type::class(wk.string, vec![]);
        let closure = type_closure(&store, &Type::class(array_list, vec![string.clone()]));

        assert!(closure.contains(&Type::class(array_list, vec![string.clone()])));
        assert!(closure.contains(&Type::class(list, vec![string.clone()])));
        assert!(closure.contains(&Type::class(collection, vec![string.clone()])));
        assert!(closure.contains(&Type::class(wk.object, vec![])));
    }

    #[test]
    fn raw_instantiations_stay_raw() {
        let store = TypeStore::with_minimal_jdk();
        let hash_map = store.class_id("java.util.HashMap").unwrap();
        let map = store.class_id("java.util.Map").unwrap();

        let closure = type_closure(&store, &Type::class(hash_map, vec![]));
        assert!(closure.contains(&Type::class(map, vec![])));
        assert!(!closure
            .iter()
            .any(|t| t.raw_class() == Some(map) && !matches!(t, Type::Class(ct) if ct.args.is_empty())));
    }

    #[test]
    fn closure_is_deterministic_and_contains_input_and_object() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let input = Type::class(wk.string, vec![]);
        let a = type_closure(&store, &input);
        let b = type_closure(&store, &input);
        assert_eq!(a, b);
        assert_eq!(a[0], input);
        assert!(a.contains(&Type::class(wk.object, vec![])));
    }

    #[test]
    fn array_closure_has_the_array_supertypes() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let ints = Type::array(Type::class(wk.integer, vec![]));
        let closure = type_closure(&store, &ints);
        assert_eq!(
            closure,
            vec![
                ints.clone(),
                Type::class(wk.cloneable, vec![]),
                Type::class(wk.serializable, vec![]),
                Type::class(wk.object, vec![]),
            ]
        );
    }

    #[test]
    fn instantiate_as_supertype_recovers_arguments() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let array_list = store.class_id("java.util.ArrayList").unwrap();
        let list = store.class_id("java.util.List").unwrap();

        let string = Type::class(wk.string, vec![]);
        let viewed =
            instantiate_as_supertype(&store, &Type::class(array_list, vec![string.clone()]), list);
        assert_eq!(viewed, Some(Type::class(list, vec![string])));

        let raw_viewed = instantiate_as_supertype(&store, &Type::class(array_list, vec![]), list);
        assert_eq!(raw_viewed, Some(Type::class(list, vec![])));
    }

    #[test]
    fn wildcards_do_not_explode_the_walk() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list = store.class_id("java.util.List").unwrap();
        let ty = Type::class(
            list,
            vec![Type::Wildcard(WildcardBound::Extends(Box::new(
                Type::class(wk.number, vec![]),
            )))],
        );
        let closure = type_closure(&store, &ty);
        assert_eq!(closure[0], ty);
    }
}
