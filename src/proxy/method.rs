//! MethodProxy - resolves methods and policies, then delegates to the engine

use crate::dispatch::{Dispatch, PolicyRegistry};
use crate::engine::CachingEngine;
use crate::error::CallError;
use crate::types::{Argument, CallOptions};

/// Entry point for memoized calls.
///
/// Built once (see [`Hoard::builder`](crate::Hoard::builder)) and passed to
/// call sites. For each call it checks that the method exists, looks up the
/// method's policy, and either calls straight through (no policy) or hands
/// the call to the [`CachingEngine`].
pub struct MethodProxy {
    engine: CachingEngine,
    policies: PolicyRegistry,
}

impl MethodProxy {
    pub fn new(engine: CachingEngine, policies: PolicyRegistry) -> Self {
        Self { engine, policies }
    }

    pub fn engine(&self) -> &CachingEngine {
        &self.engine
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Call `method` on `target`, answering from the cache when its policy
    /// allows.
    ///
    /// Fails with [`CallError::MethodNotFound`] if the target does not
    /// respond to `method`; the method's own errors come back as
    /// [`CallError::Method`].
    pub async fn call<D>(
        &self,
        target: &D,
        method: &str,
        args: &[Argument],
        options: &CallOptions,
    ) -> Result<D::Output, CallError<D::Error>>
    where
        D: Dispatch + ?Sized,
    {
        let identity = target.identity();
        if !target.responds_to(method) {
            return Err(CallError::MethodNotFound {
                type_name: identity.type_name().to_string(),
                method: method.to_string(),
            });
        }

        let Some(policy) = self.policies.get(identity.type_name(), method) else {
            return target.dispatch(method, args).await.map_err(CallError::Method);
        };

        self.engine
            .handle(identity, method, args, policy, options, || {
                target.dispatch(method, args)
            })
            .await
            .map_err(CallError::Method)
    }

    /// Evict every entry cached under any of `tags`.
    pub async fn flush_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.engine.flush_by_tags(tags).await
    }

    /// Drop the cached result of one call. Returns `false` when the method
    /// has no policy or nothing was cached.
    pub async fn forget<D>(&self, target: &D, method: &str, args: &[Argument]) -> bool
    where
        D: Dispatch + ?Sized,
    {
        let identity = target.identity();
        match self.policies.get(identity.type_name(), method) {
            Some(policy) => self.engine.forget(identity, method, args, policy).await,
            None => false,
        }
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> bool {
        self.engine.clear().await
    }
}
