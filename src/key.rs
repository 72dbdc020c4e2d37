//! Cache key derivation.
//!
//! [`generate`] is a pure function of `(target, method, arguments, policy,
//! prefix)`. Without an explicit key, every input is reduced to a list of key
//! parts which is joined and digested:
//!
//! | argument               | key part                                   |
//! |------------------------|--------------------------------------------|
//! | object reference       | `<Type>_<object id>` (identity, not value) |
//! | list / map             | `array_<digest of canonical JSON>`         |
//! | list / map, unhashable | `array_<element count>`                    |
//! | scalar / null          | type-tagged text (`i:1`, `s1:1`, `n`...)   |
//! | opaque                 | the type name                              |
//!
//! The digest is SHA-256 truncated to 128 bits and rendered as 32 hex
//! characters. Keys are stable within a process run; object ids make them
//! meaningless across runs.

use sha2::{Digest, Sha256};

use crate::types::{Argument, CachePolicy, TargetIdentity};

/// Separator between key parts (ASCII unit separator).
const PART_SEPARATOR: &str = "\x1f";

/// Number of digest bytes kept in a key.
const DIGEST_BYTES: usize = 16;

/// Derive the cache key for one call.
///
/// An explicit policy key is used verbatim after the prefix. Placeholder
/// substitution, when enabled, is applied by the engine before this is
/// called (see [`interpolate`]).
pub fn generate(
    target: &TargetIdentity,
    method: &str,
    arguments: &[Argument],
    policy: &CachePolicy,
    prefix: &str,
) -> String {
    if let Some(key) = &policy.key {
        return format!("{prefix}{key}");
    }

    let mut parts = Vec::with_capacity(arguments.len() + 3);
    parts.push(target.type_name().to_string());
    if let Some(id) = target.instance() {
        parts.push(format!("#{id}"));
    }
    parts.push(method.to_string());
    parts.extend(arguments.iter().map(key_part));

    format!("{prefix}{}", digest_hex(parts.join(PART_SEPARATOR).as_bytes()))
}

/// Replace `{N}` placeholders with the text of argument `N`.
///
/// Placeholders that are not plain decimal indexes, or that point past the
/// end of `arguments`, are left as written.
pub fn interpolate(template: &str, arguments: &[Argument]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        let arg = (!inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()))
            .then(|| inner.parse::<usize>().ok())
            .flatten()
            .and_then(|i| arguments.get(i));

        match arg {
            Some(arg) => out.push_str(&placeholder_text(arg)),
            None => {
                out.push('{');
                out.push_str(inner);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Key part for one argument.
fn key_part(arg: &Argument) -> String {
    match arg {
        Argument::Null => "n".to_string(),
        Argument::Bool(b) => format!("b:{b}"),
        Argument::Int(i) => format!("i:{i}"),
        // Non-negative integers share one form regardless of signedness.
        Argument::UInt(u) if i64::try_from(*u).is_ok() => format!("i:{u}"),
        Argument::UInt(u) => format!("u:{u}"),
        Argument::Float(f) => format!("f:{f}"),
        Argument::Str(s) => format!("s{}:{s}", s.len()),
        Argument::List(_) | Argument::Map(_) => composite_part(arg),
        Argument::Object(o) => format!("{}_{}", o.type_name(), o.id()),
        Argument::Opaque(t) => t.to_string(),
    }
}

/// Text substituted for a `{N}` placeholder.
fn placeholder_text(arg: &Argument) -> String {
    match arg {
        Argument::Null => String::new(),
        Argument::Bool(b) => b.to_string(),
        Argument::Int(i) => i.to_string(),
        Argument::UInt(u) => u.to_string(),
        Argument::Float(f) => f.to_string(),
        Argument::Str(s) => s.clone(),
        other => key_part(other),
    }
}

fn composite_part(arg: &Argument) -> String {
    match serde_json::to_vec(arg) {
        Ok(bytes) => format!("array_{}", digest_hex(&bytes)),
        Err(e) => {
            tracing::debug!(error = %e, "falling back to element count fingerprint");
            format!("array_{}", arg.len().unwrap_or(0))
        }
    }
}

fn digest_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..DIGEST_BYTES])
}
