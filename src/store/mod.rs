//! Cache store interface.
//!
//! The engine never owns entries. It talks to a [`CacheStore`]: a key-value
//! store with per-entry TTL that may also hand out tag-scoped views
//! ([`TaggedStore`]). A tagged view shares the keyspace with its parent and
//! remembers which keys were written through it, so that [`TaggedStore::flush`]
//! can evict them in bulk.
//!
//! Values are stored as `serde_json::Value`; the engine serializes results on
//! the way in and deserializes on the way out.
//!
//! # Failure semantics
//!
//! Every store method may fail with [`HoardError::StoreUnavailable`]. Stores
//! without tag support return [`HoardError::UnsupportedTagOperation`] from
//! [`CacheStore::tags`]. The engine treats both as a cache bypass.
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl CacheStore for RedisStore {
//!     fn name(&self) -> &str { "redis" }
//!     async fn has(&self, key: &str) -> Result<bool> {
//!         self.conn().await?.exists(key).await.map_err(unavailable)
//!     }
//!     // ...
//! }
//! ```

mod manager;
mod memory;

pub use manager::StoreManager;
pub use memory::{MemoryStore, MemoryStoreConfig};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{HoardError, Result};

/// Key-value store the engine caches into.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name for logging/debugging.
    fn name(&self) -> &str;

    /// Whether a live entry exists for `key`.
    async fn has(&self, key: &str) -> Result<bool>;

    /// Fetch the entry for `key`.
    ///
    /// May return `None` even right after [`has`](Self::has) returned `true`
    /// (the entry expired in between); callers treat that as a miss.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Remove one entry. Returns whether an entry was present.
    async fn forget(&self, key: &str) -> Result<bool>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Whether [`tags`](Self::tags) is supported.
    fn supports_tags(&self) -> bool {
        false
    }

    /// A view over the same keyspace whose writes are recorded under `tags`.
    fn tags(&self, tags: &[String]) -> Result<Arc<dyn TaggedStore>> {
        let _ = tags;
        Err(HoardError::UnsupportedTagOperation)
    }
}

/// Tag-scoped view of a [`CacheStore`].
#[async_trait]
pub trait TaggedStore: CacheStore {
    /// The tags this view was scoped to.
    fn scope(&self) -> &[String];

    /// Evict every entry written under any of this view's tags.
    async fn flush(&self) -> Result<()>;
}
