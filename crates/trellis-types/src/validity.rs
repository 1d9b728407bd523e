//! Registration-time validity checks for declared bean types.
//!
//! Resolution assumes well-formed types; anything rejected here is reported
//! as a definition error against the declaring bean and never reaches the
//! matching rules.

use crate::{Type, TypeEnv};

/// A bean type is illegal when it is a type variable or wildcard, an array
/// of either, or a parameterized type with a wildcard nested anywhere in
/// its arguments. Nested type variables are legal (the bean class's own
/// parameters appear there).
pub fn is_illegal_bean_type(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::TypeVar(_) | Type::Wildcard(_) => true,
        Type::Array(component) => is_illegal_bean_type(env, component),
        Type::Class(ct) => ct.args.iter().any(contains_wildcard),
        Type::Primitive(_) => false,
    }
}

fn contains_wildcard(ty: &Type) -> bool {
    match ty {
        Type::Wildcard(_) => true,
        Type::Class(ct) => ct.args.iter().any(contains_wildcard),
        Type::Array(component) => contains_wildcard(component),
        Type::TypeVar(_) | Type::Primitive(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityMismatch {
    pub class: String,
    pub expected: usize,
    pub actual: usize,
}

/// Find the first class instantiation whose argument count disagrees with
/// its definition's parameter count. Raw uses (zero arguments) are fine.
pub fn arity_mismatch(env: &dyn TypeEnv, ty: &Type) -> Option<ArityMismatch> {
    match ty {
        Type::Class(ct) => {
            let def = env.class(ct.def)?;
            if !ct.args.is_empty() && ct.args.len() != def.type_params.len() {
                return Some(ArityMismatch {
                    class: def.name.clone(),
                    expected: def.type_params.len(),
                    actual: ct.args.len(),
                });
            }
            ct.args.iter().find_map(|arg| arity_mismatch(env, arg))
        }
        Type::Array(component) => arity_mismatch(env, component),
        Type::Wildcard(crate::WildcardBound::Extends(b))
        | Type::Wildcard(crate::WildcardBound::Super(b)) => arity_mismatch(env, b),
        _ => None,
    }
}
