use hoard::{CallError, HoardError, Result};

#[test]
fn test_error_display() {
    let err = HoardError::MethodNotFound {
        type_name: "UserService".to_string(),
        method: "get_user".to_string(),
    };
    assert_eq!(err.to_string(), "method UserService::get_user does not exist");
}

#[test]
fn test_unsupported_tags_display() {
    let err = HoardError::UnsupportedTagOperation;
    assert!(err.to_string().contains("does not support tags"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(HoardError::StoreUnavailable("redis down".into()))
    }
    assert!(returns_error().is_err());
}

#[test]
fn serialization_errors_convert() {
    fn parse(raw: &str) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(raw)?)
    }
    assert!(matches!(parse("{"), Err(HoardError::Serialization(_))));
}

// ============================================================================
// Cache-layer classification
// ============================================================================

#[test]
fn cache_layer_errors() {
    assert!(HoardError::StoreUnavailable("x".into()).is_cache_layer());
    assert!(HoardError::UnsupportedTagOperation.is_cache_layer());
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(HoardError::Serialization(json_err).is_cache_layer());
}

#[test]
fn caller_errors() {
    assert!(!HoardError::InvalidPolicy("x".into()).is_cache_layer());
    assert!(!HoardError::Configuration("x".into()).is_cache_layer());
    assert!(
        !HoardError::MethodNotFound {
            type_name: "A".into(),
            method: "b".into()
        }
        .is_cache_layer()
    );
}

// ============================================================================
// CallError
// ============================================================================

#[test]
fn call_error_passes_method_error_through() {
    let err: CallError<std::io::Error> =
        CallError::Method(std::io::Error::other("disk full"));
    assert_eq!(err.to_string(), "disk full");
    assert_eq!(err.into_method_error().unwrap().to_string(), "disk full");
}

#[test]
fn call_error_method_not_found() {
    let err: CallError<String> = CallError::MethodNotFound {
        type_name: "UserService".into(),
        method: "missing".into(),
    };
    assert!(err.to_string().contains("UserService::missing"));
    assert!(err.into_method_error().is_none());
}
