//! Stable identity tokens for cache subjects.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque per-object identity handle.
///
/// Allocated from a process-wide monotonic counter, so two objects with the
/// same field values still get different ids. Ids are never reused within a
/// process and are meaningless across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the receiver a memoized method is called on.
///
/// Create one per instance at construction time and keep it for the
/// instance's lifetime:
///
/// ```rust
/// # use hoard::TargetIdentity;
/// struct UserService {
///     identity: TargetIdentity,
/// }
///
/// impl UserService {
///     fn new() -> Self {
///         Self { identity: TargetIdentity::new("UserService") }
///     }
/// }
///
/// let a = UserService::new();
/// let b = UserService::new();
/// assert_ne!(a.identity, b.identity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    type_name: Cow<'static, str>,
    instance: Option<ObjectId>,
}

impl TargetIdentity {
    /// Identity scoped to one instance: results are never shared with other
    /// instances of the same type.
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            instance: Some(ObjectId::next()),
        }
    }

    /// Identity scoped to the type: every instance created this way shares
    /// cache entries. Meant for stateless services.
    pub fn shared(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            instance: None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Instance token, `None` for type-scoped identities.
    pub fn instance(&self) -> Option<ObjectId> {
        self.instance
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance {
            Some(id) => write!(f, "{}#{id}", self.type_name),
            None => f.write_str(&self.type_name),
        }
    }
}
