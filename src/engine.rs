//! The caching decision engine.
//!
//! [`CachingEngine::handle`] decides, per call, whether to answer from the
//! store or to run the method:
//!
//! ```text
//! handle(target, method, args, policy, options, invoke)
//!         │
//!         ▼
//!   caching disabled / skip flag set? ──yes──► invoke()
//!         │ no
//!         ▼
//!   key = prefix + digest(...)   scope = plain store | store.tags(policy.tags)
//!         │
//!         ▼
//!   scope.has(key) && scope.get(key) ──hit──► return stored value
//!         │ miss
//!         ▼
//!   invoke() ──Err──► return Err unchanged (nothing stored)
//!         │ Ok
//!         ▼
//!   scope.put(key, value, ttl) ──► return value
//! ```
//!
//! Caching is best-effort. A failing store or an unsupported tag scope turns
//! the call into a plain invocation; the failure is logged and counted, never
//! returned. An entry that no longer deserializes is treated as a miss and
//! overwritten with the fresh result. The wrapped method runs
//! at most once per call: if storing the fresh result fails, that result is
//! still returned.
//!
//! Concurrent misses on the same key may each invoke the method and each
//! write the result; the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::config::Config;
use crate::key;
use crate::store::CacheStore;
use crate::telemetry;
use crate::types::{Argument, CachePolicy, CallOptions, TargetIdentity};
use crate::{HoardError, Result};

enum Lookup<T> {
    Hit(T),
    Miss(Arc<dyn CacheStore>),
}

/// Memoizes method results in a [`CacheStore`] according to a [`CachePolicy`].
///
/// Holds nothing but its store handle and an immutable [`Config`]; share it
/// behind an `Arc` or embed it in a [`MethodProxy`](crate::MethodProxy).
pub struct CachingEngine {
    store: Arc<dyn CacheStore>,
    config: Config,
}

impl CachingEngine {
    pub fn new(store: Arc<dyn CacheStore>, config: Config) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The store this engine is bound to.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.default_ttl_secs)
    }

    /// The key a call would be cached under.
    pub fn cache_key(
        &self,
        target: &TargetIdentity,
        method: &str,
        arguments: &[Argument],
        policy: &CachePolicy,
    ) -> String {
        match (&policy.key, self.config.interpolate_keys) {
            (Some(template), true) => format!(
                "{}{}",
                self.config.key_prefix,
                key::interpolate(template, arguments)
            ),
            _ => key::generate(target, method, arguments, policy, &self.config.key_prefix),
        }
    }

    /// Return the cached result of `method`, or run `invoke` and cache its
    /// `Ok` value.
    ///
    /// `invoke` performs the real call. Its error is returned as-is and is
    /// never cached.
    #[instrument(level = "debug", skip_all, fields(subject = %target, method = %method))]
    pub async fn handle<T, E, F, Fut>(
        &self,
        target: &TargetIdentity,
        method: &str,
        arguments: &[Argument],
        policy: &CachePolicy,
        options: &CallOptions,
        invoke: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(reason) = self.bypass_reason(options) {
            debug!(reason, "bypassing cache");
            metrics::counter!(telemetry::CACHE_BYPASS_TOTAL,
                "method" => method.to_owned(),
                "reason" => reason,
            )
            .increment(1);
            return invoke().await;
        }

        let ttl = policy.effective_ttl(self.config.default_ttl_secs);
        let key = self.cache_key(target, method, arguments, policy);

        let scope = match self.lookup::<T>(&key, policy).await {
            Ok(Lookup::Hit(value)) => {
                debug!(%key, "cache hit");
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "method" => method.to_owned())
                    .increment(1);
                return Ok(value);
            }
            Ok(Lookup::Miss(scope)) => scope,
            Err(e) => {
                self.report_failure("lookup", target, method, &e);
                metrics::counter!(telemetry::CACHE_BYPASS_TOTAL,
                    "method" => method.to_owned(),
                    "reason" => "error",
                )
                .increment(1);
                return invoke().await;
            }
        };

        debug!(%key, "cache miss");
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "method" => method.to_owned())
            .increment(1);

        let result = invoke().await?;
        if let Err(e) = store_result(scope.as_ref(), &key, &result, ttl).await {
            self.report_failure("store", target, method, &e);
        }
        Ok(result)
    }

    /// Evict every entry written under any of `tags`.
    ///
    /// Returns `false` when the store has no tag support (logged as a
    /// warning), when `tags` is empty, or when the flush fails (logged as an
    /// error).
    #[instrument(skip_all, fields(store = self.store.name()))]
    pub async fn flush_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let tags: Vec<String> = tags.iter().map(|t| t.as_ref().to_string()).collect();
        if tags.is_empty() {
            warn!("no tags given, nothing to flush");
            return false;
        }

        let result = match self.store.tags(&tags) {
            Ok(scope) => scope.flush().await,
            Err(e) => Err(e),
        };

        let status = match &result {
            Ok(()) => "ok",
            Err(HoardError::UnsupportedTagOperation) => {
                warn!(?tags, "current cache store does not support tags");
                "unsupported"
            }
            Err(e) => {
                error!(?tags, error = %e, "failed to flush cache by tags");
                "error"
            }
        };
        metrics::counter!(telemetry::TAG_FLUSHES_TOTAL, "status" => status).increment(1);
        result.is_ok()
    }

    /// Drop the entry a call would be cached under.
    ///
    /// Returns whether an entry was removed; store failures are logged and
    /// reported as `false`.
    pub async fn forget(
        &self,
        target: &TargetIdentity,
        method: &str,
        arguments: &[Argument],
        policy: &CachePolicy,
    ) -> bool {
        let key = self.cache_key(target, method, arguments, policy);
        match self.store.forget(&key).await {
            Ok(removed) => removed,
            Err(e) => {
                self.report_failure("forget", target, method, &e);
                false
            }
        }
    }

    /// Remove every entry from the bound store.
    pub async fn clear(&self) -> bool {
        match self.store.clear().await {
            Ok(()) => true,
            Err(e) => {
                error!(store = self.store.name(), error = %e, "failed to clear cache");
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "clear")
                    .increment(1);
                false
            }
        }
    }

    fn bypass_reason(&self, options: &CallOptions) -> Option<&'static str> {
        if !self.config.enabled {
            Some("disabled")
        } else if options.is_set(&self.config.skip_cache_flag) {
            Some("skip")
        } else {
            None
        }
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        key: &str,
        policy: &CachePolicy,
    ) -> Result<Lookup<T>> {
        let scope = if policy.tags.is_empty() {
            Arc::clone(&self.store)
        } else {
            self.store.tags(&policy.tags)? as Arc<dyn CacheStore>
        };

        if !scope.has(key).await? {
            return Ok(Lookup::Miss(scope));
        }
        let Some(value) = scope.get(key).await? else {
            // Expired between `has` and `get`.
            return Ok(Lookup::Miss(scope));
        };
        match serde_json::from_value(value) {
            Ok(value) => Ok(Lookup::Hit(value)),
            // Written for another result type; recompute and overwrite.
            Err(e) => {
                warn!(%key, error = %e, "discarding cache entry that no longer decodes");
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "decode")
                    .increment(1);
                Ok(Lookup::Miss(scope))
            }
        }
    }

    fn report_failure(
        &self,
        operation: &'static str,
        target: &TargetIdentity,
        method: &str,
        e: &HoardError,
    ) {
        match e {
            HoardError::UnsupportedTagOperation => warn!(
                target_type = target.type_name(),
                method,
                store = self.store.name(),
                operation,
                "cache store does not support tags"
            ),
            _ => error!(
                target_type = target.type_name(),
                method,
                store = self.store.name(),
                operation,
                error = %e,
                "cache operation failed"
            ),
        }
        metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => operation).increment(1);
    }
}

async fn store_result<T: Serialize>(
    scope: &dyn CacheStore,
    key: &str,
    result: &T,
    ttl: Duration,
) -> Result<()> {
    let value = serde_json::to_value(result)?;
    scope.put(key, value, ttl).await
}
