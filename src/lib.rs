//! Hoard - declarative result memoization for method calls
//!
//! This crate caches the results of expensive methods in a pluggable
//! key-value store. Each cached method gets a [`CachePolicy`] (TTL, explicit
//! key, tags); calls go through a [`MethodProxy`], which answers repeated
//! calls from the store and invokes the method only on a miss.
//!
//! Caching never changes what a call returns. Store failures degrade to a
//! direct invocation, the method's own errors pass through unchanged and are
//! never cached.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use hoard::{Argument, CachePolicy, CallOptions, Dispatch, Hoard, TargetIdentity};
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
//!         Ok(format!("User {:?}", args[0]))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let proxy = Hoard::builder()
//!         .policy("UserService", "get_user", CachePolicy::new().ttl(60).tag("users"))
//!         .build()?;
//!
//!     let service = UserService { identity: TargetIdentity::new("UserService") };
//!     let user = proxy
//!         .call(&service, "get_user", &[Argument::from(1)], &CallOptions::new())
//!         .await?;
//!     println!("{user}");
//!
//!     proxy.flush_by_tags(&["users"]).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod key;
pub mod proxy;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use config::Config;
pub use dispatch::{Dispatch, PolicyRegistry};
pub use engine::CachingEngine;
pub use error::{CallError, HoardError, Result};
pub use proxy::{Hoard, HoardBuilder, MethodProxy};
pub use store::{CacheStore, MemoryStore, MemoryStoreConfig, StoreManager, TaggedStore};
pub use types::{Argument, CachePolicy, CallOptions, ObjectId, ObjectRef, TargetIdentity};
