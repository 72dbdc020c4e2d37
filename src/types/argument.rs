//! Heterogeneous call arguments.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::identity::{ObjectId, TargetIdentity};

/// Reference to an object passed by identity.
///
/// Two `ObjectRef`s to structurally equal objects with different ids are
/// different arguments as far as the cache is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    type_name: Cow<'static, str>,
    id: ObjectId,
}

impl ObjectRef {
    pub fn new(type_name: impl Into<Cow<'static, str>>, id: ObjectId) -> Self {
        Self {
            type_name: type_name.into(),
            id,
        }
    }

    /// Reference an object through its target identity.
    ///
    /// Type-scoped identities have no instance token; they get a fresh id,
    /// which makes each such reference distinct.
    pub fn from_target(target: &TargetIdentity) -> Self {
        Self {
            type_name: Cow::Owned(target.type_name().to_string()),
            id: target.instance().unwrap_or_else(ObjectId::next),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }
}

/// A single argument of a memoized call.
///
/// Scalars and composites are fingerprinted by value, [`Argument::Object`]
/// by identity, and [`Argument::Opaque`] by type name only.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Argument>),
    Map(BTreeMap<String, Argument>),
    Object(ObjectRef),
    /// A value with no canonical form (closure, handle, stream...).
    Opaque(Cow<'static, str>),
}

impl Argument {
    /// An opaque value of the given type.
    pub fn opaque(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self::Opaque(type_name.into())
    }

    /// An object reference.
    pub fn object(type_name: impl Into<Cow<'static, str>>, id: ObjectId) -> Self {
        Self::Object(ObjectRef::new(type_name, id))
    }

    /// Short type label used in diagnostics and fallback fingerprints.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(o) => o.type_name(),
            Self::Opaque(t) => t,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::UInt(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// Element count for lists and maps, `None` for everything else.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

/// Canonical serialization used for composite fingerprints.
///
/// Maps are ordered (`BTreeMap`), objects serialize as their identity, and
/// opaque values fail so the caller can fall back to a weaker fingerprint.
///
/// Keys starting with `$` are reserved for markers (`$object`, `$float`);
/// map keys that start with `$` get one more `$` so they cannot pass for one.
/// Non-finite floats, which JSON would write as `null`, become
/// `{"$float": "NaN" | "inf" | "-inf"}`.
impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Self::Float(f) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$float", &f.to_string())?;
                map.end()
            }
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(&escape_key(k), v)?;
                }
                map.end()
            }
            Self::Object(o) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$object", o.type_name())?;
                map.serialize_entry("$id", &o.id())?;
                map.end()
            }
            Self::Opaque(t) => Err(S::Error::custom(format!(
                "value of type {t} has no canonical form"
            ))),
        }
    }
}

fn escape_key(key: &str) -> Cow<'_, str> {
    if key.starts_with('$') {
        Cow::Owned(format!("${key}"))
    } else {
        Cow::Borrowed(key)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Argument {
            fn from(v: $t) -> Self {
                Self::Int(v as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Argument {
            fn from(v: $t) -> Self {
                Self::UInt(v as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Argument {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ObjectRef> for Argument {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Argument>> From<Option<T>> for Argument {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Argument>> From<Vec<T>> for Argument {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Argument>> From<BTreeMap<String, T>> for Argument {
    fn from(v: BTreeMap<String, T>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Argument {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
