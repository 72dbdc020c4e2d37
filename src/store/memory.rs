//! In-process cache store.
//!
//! [`MemoryStore`] keeps entries in a moka cache with per-entry expiry, so
//! every `put` can carry its own TTL. Tag membership lives in a side index:
//! tag -> keys, plus the reverse key -> tags map so that overwriting or
//! forgetting a key also drops its old memberships. A key re-written under a
//! different tag set is never evicted by a flush of its previous tags.
//!
//! Entries that moka drops on its own (expiry, capacity) are reported by an
//! eviction listener and leave the index the next time it is locked. Each
//! write carries a generation, so an eviction reported late never detaches
//! a newer write of the same key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use moka::Expiry;
use moka::future::Cache;
use moka::notification::RemovalCause;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{RwLock, mpsc};

use super::{CacheStore, TaggedStore};
use crate::{HoardError, Result};

/// Configuration for [`MemoryStore`].
///
/// ```rust
/// # use hoard::MemoryStoreConfig;
/// let config = MemoryStoreConfig::new()
///     .max_entries(50_000)
///     .tags(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Maximum number of cached entries. Default: 10,000.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Whether tag-scoped views are supported. Default: true.
    #[serde(default = "default_tags")]
    pub tags: bool,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            tags: default_tags(),
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_tags() -> bool {
    true
}

impl MemoryStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Enable or disable tag support.
    pub fn tags(mut self, enabled: bool) -> Self {
        self.tags = enabled;
        self
    }
}

#[derive(Clone, Debug)]
struct StoredEntry {
    value: Value,
    ttl: Duration,
    /// Tells this write apart from earlier writes of the same key.
    generation: u64,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An entry moka dropped on its own (expired or evicted for capacity).
struct Eviction {
    key: String,
    generation: u64,
}

#[derive(Debug)]
struct Membership {
    tags: Vec<String>,
    generation: u64,
}

#[derive(Debug, Default)]
struct TagIndex {
    members: HashMap<String, HashSet<String>>,
    key_tags: HashMap<String, Membership>,
}

impl TagIndex {
    fn contains(&self, key: &str) -> bool {
        self.key_tags.contains_key(key)
    }

    fn attach(&mut self, key: &str, tags: &[String], generation: u64) {
        self.detach(key);
        if tags.is_empty() {
            return;
        }
        for tag in tags {
            self.members
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.key_tags.insert(
            key.to_string(),
            Membership {
                tags: tags.to_vec(),
                generation,
            },
        );
    }

    fn detach(&mut self, key: &str) {
        let Some(membership) = self.key_tags.remove(key) else {
            return;
        };
        for tag in membership.tags {
            if let Some(keys) = self.members.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.members.remove(&tag);
                }
            }
        }
    }

    /// Detach `key` only if its membership still belongs to the evicted write.
    fn detach_evicted(&mut self, key: &str, generation: u64) {
        if self
            .key_tags
            .get(key)
            .is_some_and(|m| m.generation == generation)
        {
            self.detach(key);
        }
    }

    /// Remove and return every key that belongs to any of `tags`.
    fn take(&mut self, tags: &[String]) -> Vec<String> {
        let keys: HashSet<String> = tags
            .iter()
            .filter_map(|t| self.members.get(t))
            .flatten()
            .cloned()
            .collect();
        for key in &keys {
            self.detach(key);
        }
        keys.into_iter().collect()
    }

    fn clear(&mut self) {
        self.members.clear();
        self.key_tags.clear();
    }
}

/// The tag index and the evictions reported since it was last locked.
struct IndexState {
    tags: TagIndex,
    evictions: mpsc::UnboundedReceiver<Eviction>,
}

impl IndexState {
    fn apply_evictions(&mut self) {
        while let Ok(eviction) = self.evictions.try_recv() {
            self.tags.detach_evicted(&eviction.key, eviction.generation);
        }
    }
}

struct Shared {
    entries: Cache<String, StoredEntry>,
    /// `None` when tag support is disabled.
    index: Option<RwLock<IndexState>>,
    generation: AtomicU64,
}

impl Shared {
    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).await.map(|e| e.value)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration, tags: &[String]) {
        let entry = StoredEntry {
            value,
            ttl,
            generation: self.generation.fetch_add(1, Ordering::Relaxed),
        };
        let Some(index) = &self.index else {
            return self.entries.insert(key.to_string(), entry).await;
        };

        // Untagged writes of keys without memberships never touch the index.
        if tags.is_empty() && !index.read().await.tags.contains(key) {
            return self.entries.insert(key.to_string(), entry).await;
        }

        // Held across the insert so a concurrent flush of these tags
        // cannot miss the new membership.
        let mut index = index.write().await;
        index.apply_evictions();
        index.tags.attach(key, tags, entry.generation);
        self.entries.insert(key.to_string(), entry).await;
    }

    async fn forget(&self, key: &str) -> bool {
        if let Some(index) = &self.index {
            let mut index = index.write().await;
            index.apply_evictions();
            index.tags.detach(key);
        }
        self.entries.remove(key).await.is_some()
    }

    async fn clear(&self) {
        if let Some(index) = &self.index {
            let mut index = index.write().await;
            index.apply_evictions();
            index.tags.clear();
        }
        self.entries.invalidate_all();
    }

    async fn flush(&self, tags: &[String]) -> Result<usize> {
        let index = self
            .index
            .as_ref()
            .ok_or(HoardError::UnsupportedTagOperation)?;
        let mut index = index.write().await;
        index.apply_evictions();
        let keys = index.tags.take(tags);
        join_all(keys.iter().map(|k| self.entries.invalidate(k.as_str()))).await;
        Ok(keys.len())
    }
}

/// Thread-safe in-memory store with per-entry TTL and optional tag support.
///
/// Cloning is cheap and yields a handle to the same entries.
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create a store named `"memory"` with the default configuration.
    pub fn new() -> Self {
        Self::with_config("memory", &MemoryStoreConfig::default())
    }

    /// Create a named store from the given configuration.
    pub fn with_config(name: impl Into<String>, config: &MemoryStoreConfig) -> Self {
        let mut builder = Cache::<String, StoredEntry>::builder()
            .max_capacity(config.max_entries)
            .expire_after(PerEntryTtl);

        let index = if config.tags {
            let (tx, rx) = mpsc::unbounded_channel();
            // Explicit removals and replacements update the index themselves.
            builder = builder.eviction_listener(
                move |key: Arc<String>, entry: StoredEntry, cause: RemovalCause| {
                    if matches!(cause, RemovalCause::Expired | RemovalCause::Size) {
                        let _ = tx.send(Eviction {
                            key: key.as_ref().clone(),
                            generation: entry.generation,
                        });
                    }
                },
            );
            Some(RwLock::new(IndexState {
                tags: TagIndex::default(),
                evictions: rx,
            }))
        } else {
            None
        };

        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                entries: builder.build(),
                index,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Number of entries currently in the store (approximate, per moka).
    pub fn len(&self) -> u64 {
        self.shared.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.shared.has(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.shared.get(key).await)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.shared.put(key, value, ttl, &[]).await;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.shared.forget(key).await)
    }

    async fn clear(&self) -> Result<()> {
        self.shared.clear().await;
        Ok(())
    }

    fn supports_tags(&self) -> bool {
        self.shared.index.is_some()
    }

    fn tags(&self, tags: &[String]) -> Result<Arc<dyn TaggedStore>> {
        if !self.supports_tags() {
            return Err(HoardError::UnsupportedTagOperation);
        }
        Ok(Arc::new(TaggedMemoryStore {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
            tags: tags.to_vec(),
        }))
    }
}

/// Tag-scoped view of a [`MemoryStore`].
struct TaggedMemoryStore {
    name: String,
    shared: Arc<Shared>,
    tags: Vec<String>,
}

#[async_trait]
impl CacheStore for TaggedMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.shared.has(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.shared.get(key).await)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.shared.put(key, value, ttl, &self.tags).await;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.shared.forget(key).await)
    }

    async fn clear(&self) -> Result<()> {
        self.shared.clear().await;
        Ok(())
    }

    fn supports_tags(&self) -> bool {
        true
    }

    /// Narrowing a view again widens its tag set.
    fn tags(&self, tags: &[String]) -> Result<Arc<dyn TaggedStore>> {
        let mut combined = self.tags.clone();
        combined.extend(tags.iter().filter(|t| !self.tags.contains(t)).cloned());
        Ok(Arc::new(TaggedMemoryStore {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
            tags: combined,
        }))
    }
}

#[async_trait]
impl TaggedStore for TaggedMemoryStore {
    fn scope(&self) -> &[String] {
        &self.tags
    }

    async fn flush(&self) -> Result<()> {
        let evicted = self.shared.flush(&self.tags).await?;
        tracing::debug!(store = %self.name, tags = ?self.tags, evicted, "flushed tagged entries");
        Ok(())
    }
}
