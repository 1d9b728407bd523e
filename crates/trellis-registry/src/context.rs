//! The explicit per-deployment state object.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trellis_bindings::BindingStore;
use trellis_core::{Memo, ResolutionError};
use trellis_types::TypeStore;

use crate::bean::{BeanId, ObserverId};
use crate::closure::DeploymentClosure;
use crate::resolution::{InterceptorKey, Resolution, ResolutionKey};

/// Everything a resolution call needs, passed by reference: never a
/// process-wide singleton, never thread-local.
///
/// Owns the memoized metadata and resolution caches for exactly one
/// deployment closure. [`DeploymentContext::dispose`] is the explicit
/// teardown; it is idempotent, clears every cache, and flips the context
/// into a state where resolution refuses to run. Dropping the context
/// releases the same memory without the explicit step, but long-lived
/// processes that boot deployments repeatedly should dispose deterministically.
#[derive(Debug)]
pub struct DeploymentContext {
    types: TypeStore,
    bindings: BindingStore,
    closure: DeploymentClosure,
    bean_cache: Memo<ResolutionKey, Resolution>,
    name_cache: Memo<String, Resolution>,
    observer_cache: Memo<ResolutionKey, Vec<ObserverId>>,
    interceptor_cache: Memo<InterceptorKey, Vec<BeanId>>,
    disposed: AtomicBool,
}

impl DeploymentContext {
    pub fn new(types: TypeStore, bindings: BindingStore, closure: DeploymentClosure) -> Self {
        Self {
            types,
            bindings,
            closure,
            bean_cache: Memo::new(),
            name_cache: Memo::new(),
            observer_cache: Memo::new(),
            interceptor_cache: Memo::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn types(&self) -> &TypeStore {
        &self.types
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn closure(&self) -> &DeploymentClosure {
        &self.closure
    }

    /// Replace the closure after an extension registration phase added
    /// beans. All resolution caches are invalidated; resolution issued
    /// before this point and after it see different registries.
    pub fn replace_closure(&mut self, closure: DeploymentClosure) {
        tracing::debug!("replacing deployment closure; invalidating resolution caches");
        self.closure = closure;
        self.invalidate_caches();
    }

    pub fn invalidate_caches(&self) {
        self.bean_cache.clear();
        self.name_cache.clear();
        self.observer_cache.clear();
        self.interceptor_cache.clear();
    }

    fn ensure_live(&self) -> Result<(), ResolutionError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(ResolutionError::ContextDisposed)
        } else {
            Ok(())
        }
    }

    /// Memoized bean resolution: compute-if-absent per key; duplicate
    /// concurrent computation for the same key is tolerated.
    pub fn bean_resolution(
        &self,
        key: &ResolutionKey,
        compute: impl FnOnce() -> Resolution,
    ) -> Result<Arc<Resolution>, ResolutionError> {
        self.ensure_live()?;
        Ok(self.bean_cache.get_or_insert_with(key, compute))
    }

    pub fn name_resolution(
        &self,
        name: &str,
        compute: impl FnOnce() -> Resolution,
    ) -> Result<Arc<Resolution>, ResolutionError> {
        self.ensure_live()?;
        Ok(self
            .name_cache
            .get_or_insert_with(&name.to_string(), compute))
    }

    pub fn observer_resolution(
        &self,
        key: &ResolutionKey,
        compute: impl FnOnce() -> Vec<ObserverId>,
    ) -> Result<Arc<Vec<ObserverId>>, ResolutionError> {
        self.ensure_live()?;
        Ok(self.observer_cache.get_or_insert_with(key, compute))
    }

    pub fn interceptor_resolution(
        &self,
        key: &InterceptorKey,
        compute: impl FnOnce() -> Vec<BeanId>,
    ) -> Result<Arc<Vec<BeanId>>, ResolutionError> {
        self.ensure_live()?;
        Ok(self.interceptor_cache.get_or_insert_with(key, compute))
    }

    /// Tear the deployment down. Idempotent; callable from any thread.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("disposing deployment context");
        self.invalidate_caches();
        self.bindings.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
