//! Per-method caching policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HoardError, Result};

/// How results of one method are cached.
///
/// ```rust
/// # use hoard::CachePolicy;
/// let policy = CachePolicy::new()
///     .ttl(60)
///     .tags(["users", "profiles"]);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time-to-live in seconds. Falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Explicit cache key, used instead of the derived one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Invalidation groups the entry is written under.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, secs: u64) -> Self {
        self.ttl = Some(secs);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Effective TTL given the configured default.
    pub fn effective_ttl(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.ttl.unwrap_or(default_secs))
    }

    /// Reject policies the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.ttl == Some(0) {
            return Err(HoardError::InvalidPolicy("ttl must be greater than zero".into()));
        }
        if self.key.as_deref().is_some_and(str::is_empty) {
            return Err(HoardError::InvalidPolicy("explicit key must not be empty".into()));
        }
        if self.tags.iter().any(String::is_empty) {
            return Err(HoardError::InvalidPolicy("tag names must not be empty".into()));
        }
        Ok(())
    }
}
