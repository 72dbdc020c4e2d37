//! Invocation seam and policy registry.
//!
//! Methods are not discovered by introspection. A target implements
//! [`Dispatch`] to say which method names it answers to and how to run them,
//! and caching policies are registered up front in a [`PolicyRegistry`]
//! keyed by `(type name, method name)`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use hoard::{Argument, Dispatch, TargetIdentity};
//!
//! struct UserService {
//!     identity: TargetIdentity,
//! }
//!
//! #[async_trait]
//! impl Dispatch for UserService {
//!     type Output = String;
//!     type Error = std::convert::Infallible;
//!
//!     fn identity(&self) -> &TargetIdentity {
//!         &self.identity
//!     }
//!
//!     fn responds_to(&self, method: &str) -> bool {
//!         method == "get_user"
//!     }
//!
//!     async fn dispatch(&self, _method: &str, args: &[Argument]) -> Result<String, Self::Error> {
//!         Ok(format!("User {:?}", args.first()))
//!     }
//! }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::types::{Argument, CachePolicy, TargetIdentity};

/// A receiver whose methods can be called by name.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// What every method of this target returns.
    type Output: Serialize + DeserializeOwned + Send;
    /// The methods' own error type, passed through to the caller untouched.
    type Error: Send;

    /// Identity used to scope cache entries to this receiver.
    fn identity(&self) -> &TargetIdentity;

    /// Whether `method` exists on this target.
    fn responds_to(&self, method: &str) -> bool;

    /// Run `method` with `args`. Only called when
    /// [`responds_to`](Self::responds_to) returned `true`.
    async fn dispatch(
        &self,
        method: &str,
        args: &[Argument],
    ) -> std::result::Result<Self::Output, Self::Error>;
}

/// Caching policies by `(type name, method name)`.
///
/// Methods without a registered policy are not cached.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<(String, String), CachePolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the policy for `type_name::method`.
    ///
    /// Fails with [`HoardError::InvalidPolicy`](crate::HoardError::InvalidPolicy)
    /// if the policy does not validate.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        policy: CachePolicy,
    ) -> Result<()> {
        policy.validate()?;
        self.policies
            .insert((type_name.into(), method.into()), policy);
        Ok(())
    }

    pub fn get(&self, type_name: &str, method: &str) -> Option<&CachePolicy> {
        self.policies
            .get(&(type_name.to_string(), method.to_string()))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Every distinct tag used by a registered policy, sorted.
    pub fn known_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .policies
            .values()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}
