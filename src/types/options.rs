//! Call-time options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-call options passed alongside the arguments.
///
/// The engine only looks at one entry: the skip flag, whose name is
/// configured through [`Config::skip_cache_flag`](crate::Config::skip_cache_flag).
/// Everything else is carried for the caller's own use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallOptions(BTreeMap<String, Value>);

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the named option is present and truthy.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CallOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Loose truthiness: `false`, `null`, zero, `""`, `"0"`, `"false"` and
/// empty collections are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_values() {
        for v in [json!(true), json!(1), json!(-2.5), json!("yes"), json!([0]), json!({"a": 1})] {
            assert!(is_truthy(&v), "{v} should be truthy");
        }
    }

    #[test]
    fn falsy_values() {
        for v in [json!(false), json!(null), json!(0), json!(0.0), json!(""), json!("0"), json!("FALSE"), json!([]), json!({})] {
            assert!(!is_truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn missing_option_is_not_set() {
        let opts = CallOptions::new().with("other", true);
        assert!(!opts.is_set("skip_cache"));
        assert!(opts.is_set("other"));
    }

    #[test]
    fn collects_from_pairs() {
        let opts: CallOptions = [("skip_cache", true)].into_iter().collect();
        assert!(opts.is_set("skip_cache"));
    }
}
