//! Type-safe resolution over a deployment context.
//!
//! The resolver is a pure function per request: gather candidates from the
//! raw-type index, filter by the bean-type matching rules and qualifier
//! equivalence, apply enablement and specialization suppression, then decide
//! between resolved, unsatisfied, and ambiguous. Results are memoized in the
//! [`trellis_registry::DeploymentContext`]'s caches; unsatisfied and
//! ambiguous outcomes are data, not errors, until the caller decides they
//! are (deferred for required injection points, immediate for dynamic
//! lookups).

mod interceptors;
mod lookup;
mod name;
mod observers;
mod resolvable;
mod resolver;

pub use interceptors::{resolve_interceptors, InterceptorResolutionError};
pub use lookup::DynamicLookup;
pub use name::resolve_name;
pub use observers::resolve_observers;
pub use resolvable::ResolvableBuilder;
pub use resolver::{resolve, resolve_required};
