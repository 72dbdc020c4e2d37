//! Named store instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::CacheStore;
use crate::{HoardError, Result};

/// Registry of named stores the engine can bind to.
///
/// The first store registered becomes the default unless another one is
/// chosen with [`set_default`](Self::set_default).
#[derive(Default, Clone)]
pub struct StoreManager {
    stores: BTreeMap<String, Arc<dyn CacheStore>>,
    default: Option<String>,
}

impl StoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under `name`, replacing any store with that name.
    pub fn register(&mut self, name: impl Into<String>, store: Arc<dyn CacheStore>) {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.stores.insert(name, store);
    }

    /// Make `name` the default store.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.stores.contains_key(name) {
            return Err(unknown_store(name));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// The store named `name`, or the default store when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn CacheStore>> {
        let name = match name.or(self.default.as_deref()) {
            Some(name) => name,
            None => {
                return Err(HoardError::Configuration(
                    "no cache store registered".to_string(),
                ));
            }
        };
        self.stores
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_store(name))
    }

    /// Registered store names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

fn unknown_store(name: &str) -> HoardError {
    HoardError::Configuration(format!("unknown cache store: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn empty_manager_has_no_default() {
        let manager = StoreManager::new();
        assert!(matches!(
            manager.resolve(None),
            Err(HoardError::Configuration(_))
        ));
    }

    #[test]
    fn first_registered_is_default() {
        let mut manager = StoreManager::new();
        manager.register("primary", Arc::new(MemoryStore::new()));
        manager.register("secondary", Arc::new(MemoryStore::new()));
        assert!(manager.resolve(None).is_ok());
        assert_eq!(manager.default.as_deref(), Some("primary"));
    }

    #[test]
    fn resolve_by_name() {
        let mut manager = StoreManager::new();
        manager.register("a", Arc::new(MemoryStore::with_config("a", &Default::default())));
        manager.register("b", Arc::new(MemoryStore::with_config("b", &Default::default())));
        assert_eq!(manager.resolve(Some("b")).unwrap().name(), "b");
        assert!(manager.resolve(Some("c")).is_err());
    }

    #[test]
    fn set_default_requires_known_store() {
        let mut manager = StoreManager::new();
        manager.register("a", Arc::new(MemoryStore::new()));
        assert!(manager.set_default("missing").is_err());
        manager.register("b", Arc::new(MemoryStore::new()));
        manager.set_default("b").unwrap();
        assert_eq!(manager.names(), vec!["a", "b"]);
        assert_eq!(manager.default.as_deref(), Some("b"));
    }
}
