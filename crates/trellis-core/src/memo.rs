use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

/// A compute-if-absent cache.
///
/// Reads take the shared lock only. A miss computes the value outside any
/// lock and the first writer wins, so two threads racing on the same key may
/// both compute; results must be idempotent. Failed computations leave the
/// cache untouched; only successful results are ever stored.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read().get(key).cloned()
    }

    pub fn get_or_insert_with(&self, key: &K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(value) = self.entries.read().get(key) {
            return value.clone();
        }
        let value = Arc::new(compute());
        let mut entries = self.entries.write();
        entries.entry(key.clone()).or_insert(value).clone()
    }

    /// Fallible variant of [`Memo::get_or_insert_with`]. An `Err` is returned
    /// to the caller and nothing is cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.entries.read().get(key) {
            return Ok(value.clone());
        }
        let value = Arc::new(compute()?);
        let mut entries = self.entries.write();
        Ok(entries.entry(key.clone()).or_insert(value).clone())
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: Eq + Hash + Clone, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
