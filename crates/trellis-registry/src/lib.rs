//! The bean registry: beans, archives, the deployment closure, and the
//! per-deployment context object.
//!
//! Registration follows a single-writer-then-many-readers lifecycle: the
//! bootstrap collaborator registers beans into [`BeanArchive`]s, builds a
//! [`DeploymentClosure`] over the accessible archives, and wraps everything
//! in a [`DeploymentContext`] that is passed by reference to every
//! resolution call. There is no process-wide state; tearing a deployment
//! down is [`DeploymentContext::dispose`], which is explicit and idempotent.

mod archive;
mod bean;
mod closure;
mod context;
mod enablement;
mod resolution;

pub use archive::BeanArchive;
pub use bean::{Bean, BeanBuilder, BeanId, BeanKind, InterceptionKind, Observer, ObserverId};
pub use closure::{DeploymentClosure, TypeKey};
pub use context::DeploymentContext;
pub use enablement::Enablement;
pub use resolution::{InterceptorKey, Resolution, ResolutionKey};
