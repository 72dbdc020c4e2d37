//! Builder for configuring proxy instances

use std::sync::Arc;

use tracing::debug;

use super::MethodProxy;
use crate::Result;
use crate::config::Config;
use crate::dispatch::PolicyRegistry;
use crate::engine::CachingEngine;
use crate::store::{CacheStore, MemoryStore, StoreManager};
use crate::types::CachePolicy;

/// Name under which the built-in memory store is registered.
pub const MEMORY_STORE: &str = "memory";

/// Main entry point for creating proxy instances.
pub struct Hoard;

impl Hoard {
    /// Create a new builder for configuring the proxy.
    pub fn builder() -> HoardBuilder {
        HoardBuilder::new()
    }
}

/// Builder for configuring proxy instances.
///
/// ```rust
/// # use hoard::{CachePolicy, Config, Hoard};
/// let proxy = Hoard::builder()
///     .config(Config::new().default_ttl(300))
///     .policy("UserService", "get_user", CachePolicy::new().ttl(60))
///     .policy("UserService", "get_profile", CachePolicy::new().tag("users"))
///     .build()?;
/// assert_eq!(proxy.policies().len(), 2);
/// # Ok::<(), hoard::HoardError>(())
/// ```
pub struct HoardBuilder {
    config: Config,
    stores: StoreManager,
    default_store: Option<String>,
    policies: Vec<(String, String, CachePolicy)>,
}

impl HoardBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            stores: StoreManager::new(),
            default_store: None,
            policies: Vec::new(),
        }
    }

    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Register a named store.
    ///
    /// Without any registered store, a [`MemoryStore`] configured from
    /// [`Config::memory`] is registered as `"memory"`.
    pub fn store(mut self, name: impl Into<String>, store: Arc<dyn CacheStore>) -> Self {
        self.stores.register(name, store);
        self
    }

    /// Store to bind to when [`Config::store`] is unset.
    pub fn default_store(mut self, name: impl Into<String>) -> Self {
        self.default_store = Some(name.into());
        self
    }

    /// Cache results of `type_name::method` according to `policy`.
    pub fn policy(
        mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        policy: CachePolicy,
    ) -> Self {
        self.policies
            .push((type_name.into(), method.into(), policy));
        self
    }

    /// Build the proxy.
    ///
    /// Fails with a configuration error if the config is invalid or names an
    /// unknown store, and with `InvalidPolicy` if any policy is invalid.
    pub fn build(self) -> Result<MethodProxy> {
        self.config.validate()?;

        let mut stores = self.stores;
        if stores.is_empty() {
            stores.register(
                MEMORY_STORE,
                Arc::new(MemoryStore::with_config(MEMORY_STORE, &self.config.memory)),
            );
        }
        if let Some(name) = &self.default_store {
            stores.set_default(name)?;
        }
        let store = stores.resolve(self.config.store.as_deref())?;

        let mut registry = PolicyRegistry::new();
        for (type_name, method, policy) in self.policies {
            registry.register(type_name, method, policy)?;
        }

        debug!(
            store = store.name(),
            enabled = self.config.enabled,
            policies = registry.len(),
            "method proxy built"
        );

        Ok(MethodProxy::new(
            CachingEngine::new(store, self.config),
            registry,
        ))
    }
}

impl Default for HoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
