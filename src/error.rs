//! Hoard error types

/// Hoard error types
#[derive(Debug, thiserror::Error)]
pub enum HoardError {
    // Store errors
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// The bound store cannot scope entries by tag.
    #[error("cache store does not support tags")]
    UnsupportedTagOperation,

    // Data errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Caller errors
    #[error("method {type_name}::{method} does not exist")]
    MethodNotFound { type_name: String, method: String },

    #[error("invalid cache policy: {0}")]
    InvalidPolicy(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HoardError {
    /// Whether this error comes from the cache layer itself.
    ///
    /// Cache-layer errors are swallowed by the engine, which falls back to
    /// invoking the method directly. Everything else reaches the caller.
    pub fn is_cache_layer(&self) -> bool {
        matches!(
            self,
            HoardError::StoreUnavailable(_)
                | HoardError::UnsupportedTagOperation
                | HoardError::Serialization(_)
        )
    }
}

/// Error returned by [`MethodProxy::call`](crate::MethodProxy::call).
///
/// Separates caller misuse (the method does not exist) from the method's own
/// failure, which is passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    #[error("method {type_name}::{method} does not exist")]
    MethodNotFound { type_name: String, method: String },

    #[error("{0}")]
    Method(E),
}

impl<E> CallError<E> {
    /// The method's own error, if that is what this is.
    pub fn into_method_error(self) -> Option<E> {
        match self {
            CallError::Method(e) => Some(e),
            CallError::MethodNotFound { .. } => None,
        }
    }
}

/// Result type alias for Hoard operations
pub type Result<T> = std::result::Result<T, HoardError>;
