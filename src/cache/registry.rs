//! Cache registry - central management for all caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{CacheConfig, TypedCache};

/// Caches are keyed by name and by their key/value types, so two
/// repositories asking for the same name with different types get
/// independent caches instead of a type clash.
type RegistryKey = (String, TypeId);

/// Central registry of named typed caches.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<RegistryKey, Box<dyn Any + Send + Sync>>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing cache or create it with `config`.
    ///
    /// `config` is ignored when the cache already exists.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let key = (name.to_string(), TypeId::of::<TypedCache<K, V>>());

        if let Some(cache) = self.lookup::<K, V>(&key) {
            return cache;
        }

        let mut caches = self.caches.write();
        // Another thread may have won the race between the read and write lock.
        if let Some(existing) = caches
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<TypedCache<K, V>>())
        {
            return existing.clone();
        }

        debug!("Creating cache: {}", name);
        let cache = TypedCache::new(name, config);
        caches.insert(key, Box::new(cache.clone()));
        cache
    }

    fn lookup<K, V>(&self, key: &RegistryKey) -> Option<TypedCache<K, V>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.caches
            .read()
            .get(key)
            .and_then(|entry| entry.downcast_ref::<TypedCache<K, V>>())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_names", &caches.keys().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_and_types_share_storage() {
        let registry = CacheRegistry::new();
        let a: TypedCache<u64, String> = registry.get_or_create("users", CacheConfig::users());
        let b: TypedCache<u64, String> = registry.get_or_create("users", CacheConfig::default());

        a.insert(1, "mitsuri".to_string());
        assert_eq!(b.get(&1).as_deref(), Some("mitsuri"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_name_different_types_are_isolated() {
        let registry = CacheRegistry::new();
        let ids: TypedCache<u64, String> = registry.get_or_create("lookup", CacheConfig::default());
        let names: TypedCache<String, u64> = registry.get_or_create("lookup", CacheConfig::default());

        ids.insert(1, "a".to_string());
        names.insert("a".to_string(), 1);

        assert_eq!(registry.len(), 2);
        assert_eq!(names.get(&"a".to_string()), Some(1));
    }
}
