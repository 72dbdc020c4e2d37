//! Tests for [`MethodProxy`] and [`HoardBuilder`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use hoard::{
    Argument, CachePolicy, CallError, CallOptions, Config, Dispatch, Hoard, HoardError,
    MemoryStore, MemoryStoreConfig, MethodProxy, ObjectRef, TargetIdentity,
};

// ============================================================================
// Mock target
// ============================================================================

struct UserService {
    identity: TargetIdentity,
    calls: AtomicUsize,
}

impl UserService {
    fn new() -> Self {
        Self {
            identity: TargetIdentity::new("UserService"),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatch for UserService {
    type Output = String;
    type Error = String;

    fn identity(&self) -> &TargetIdentity {
        &self.identity
    }

    fn responds_to(&self, method: &str) -> bool {
        matches!(method, "get_user" | "get_profile" | "search" | "fail")
    }

    async fn dispatch(&self, method: &str, args: &[Argument]) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "get_user" => Ok(format!("User {:?}", args.first())),
            "get_profile" => Ok(format!("Profile {}", self.calls())),
            "search" => Ok(format!("{} results", args.len())),
            _ => Err("lookup failed".to_string()),
        }
    }
}

fn proxy() -> MethodProxy {
    Hoard::builder()
        .policy("UserService", "get_user", CachePolicy::new().ttl(60))
        .policy("UserService", "get_profile", CachePolicy::new().tag("users"))
        .policy("UserService", "fail", CachePolicy::new())
        .build()
        .unwrap()
}

fn no_options() -> CallOptions {
    CallOptions::new()
}

// ============================================================================
// call
// ============================================================================

#[tokio::test]
async fn cached_method_runs_once() {
    let proxy = proxy();
    let service = UserService::new();
    let args = [Argument::from(1)];

    let first = proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    let second = proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn method_without_policy_is_called_directly() {
    let proxy = proxy();
    let service = UserService::new();
    let args = [Argument::from("rust")];

    proxy.call(&service, "search", &args, &no_options()).await.unwrap();
    proxy.call(&service, "search", &args, &no_options()).await.unwrap();
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn unknown_method_is_rejected_without_invoking() {
    let proxy = proxy();
    let service = UserService::new();

    let err = proxy
        .call(&service, "delete_everything", &[], &no_options())
        .await
        .unwrap_err();
    match err {
        CallError::MethodNotFound { type_name, method } => {
            assert_eq!(type_name, "UserService");
            assert_eq!(method, "delete_everything");
        }
        CallError::Method(e) => panic!("unexpected method error: {e}"),
    }
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn method_error_is_passed_through() {
    let proxy = proxy();
    let service = UserService::new();

    let err = proxy.call(&service, "fail", &[], &no_options()).await.unwrap_err();
    assert_eq!(err.to_string(), "lookup failed");
    assert_eq!(err.into_method_error().as_deref(), Some("lookup failed"));

    proxy.call(&service, "fail", &[], &no_options()).await.unwrap_err();
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn skip_option_forces_invocation() {
    let proxy = proxy();
    let service = UserService::new();
    let args = [Argument::from(1)];

    proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    let skip = CallOptions::new().with("skip_cache", true);
    proxy.call(&service, "get_user", &args, &skip).await.unwrap();
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn object_arguments_key_by_identity() {
    let proxy = proxy();
    let service = UserService::new();
    let owner = TargetIdentity::new("Team");
    let other = TargetIdentity::new("Team");

    let a = [Argument::from(ObjectRef::from_target(&owner))];
    let b = [Argument::from(ObjectRef::from_target(&other))];
    proxy.call(&service, "get_user", &a, &no_options()).await.unwrap();
    proxy.call(&service, "get_user", &a, &no_options()).await.unwrap();
    proxy.call(&service, "get_user", &b, &no_options()).await.unwrap();
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn works_through_trait_objects() {
    let proxy = proxy();
    let service: Arc<dyn Dispatch<Output = String, Error = String>> = Arc::new(UserService::new());
    let args = [Argument::from(9)];

    let user = proxy
        .call(service.as_ref(), "get_user", &args, &no_options())
        .await
        .unwrap();
    assert!(user.starts_with("User"));
}

// ============================================================================
// flush_by_tags / forget / clear
// ============================================================================

#[tokio::test]
async fn flush_recomputes_tagged_results() {
    let proxy = proxy();
    let service = UserService::new();

    let before = proxy.call(&service, "get_profile", &[], &no_options()).await.unwrap();
    let cached = proxy.call(&service, "get_profile", &[], &no_options()).await.unwrap();
    assert_eq!(before, cached);

    assert!(proxy.flush_by_tags(&["users"]).await);
    let after = proxy.call(&service, "get_profile", &[], &no_options()).await.unwrap();
    assert_ne!(before, after);
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn flush_on_untagged_store_returns_false() {
    let proxy = Hoard::builder()
        .store(
            "plain",
            Arc::new(MemoryStore::with_config("plain", &MemoryStoreConfig::new().tags(false))),
        )
        .build()
        .unwrap();
    assert!(!proxy.flush_by_tags(&["users"]).await);
}

#[tokio::test]
async fn forget_uses_registered_policy() {
    let proxy = proxy();
    let service = UserService::new();
    let args = [Argument::from(1)];

    proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    assert!(proxy.forget(&service, "get_user", &args).await);
    proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    assert_eq!(service.calls(), 2);

    // No policy, nothing to forget.
    assert!(!proxy.forget(&service, "search", &args).await);
}

#[tokio::test]
async fn clear_empties_the_store() {
    let proxy = proxy();
    let service = UserService::new();
    let args = [Argument::from(1)];

    proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    assert!(proxy.clear().await);
    proxy.call(&service, "get_user", &args, &no_options()).await.unwrap();
    assert_eq!(service.calls(), 2);
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn builder_defaults_to_memory_store() {
    let proxy = Hoard::builder().build().unwrap();
    assert_eq!(proxy.engine().store().name(), "memory");
    assert!(proxy.engine().is_enabled());
    assert!(proxy.policies().is_empty());
}

#[test]
fn builder_binds_configured_store() {
    let proxy = Hoard::builder()
        .config(Config::new().store("secondary"))
        .store("primary", Arc::new(MemoryStore::with_config("primary", &MemoryStoreConfig::new())))
        .store("secondary", Arc::new(MemoryStore::with_config("secondary", &MemoryStoreConfig::new())))
        .build()
        .unwrap();
    assert_eq!(proxy.engine().store().name(), "secondary");
}

#[test]
fn builder_default_store_override() {
    let proxy = Hoard::builder()
        .store("primary", Arc::new(MemoryStore::with_config("primary", &MemoryStoreConfig::new())))
        .store("secondary", Arc::new(MemoryStore::with_config("secondary", &MemoryStoreConfig::new())))
        .default_store("secondary")
        .build()
        .unwrap();
    assert_eq!(proxy.engine().store().name(), "secondary");
}

#[test]
fn builder_rejects_unknown_store() {
    let err = Hoard::builder()
        .config(Config::new().store("redis"))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, HoardError::Configuration(_)));
    assert!(err.to_string().contains("redis"));
}

#[test]
fn builder_rejects_invalid_policy() {
    let err = Hoard::builder()
        .policy("UserService", "get_user", CachePolicy::new().ttl(0))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, HoardError::InvalidPolicy(_)));
}

#[test]
fn builder_rejects_invalid_config() {
    let err = Hoard::builder()
        .config(Config::new().default_ttl(0))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, HoardError::Configuration(_)));
}
