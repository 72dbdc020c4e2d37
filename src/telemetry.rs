//! Telemetry metric name constants.
//!
//! Centralised metric names for hoard operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hoard_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `method` — name of the memoized method
//! - `reason` — why a call bypassed the cache: "disabled", "skip" or "error"
//! - `operation` — store operation that failed: "lookup", "decode", "store", "forget", "clear"
//! - `status` — outcome: "ok", "unsupported" or "error"

/// Total calls answered from the cache.
///
/// Labels: `method`.
pub const CACHE_HITS_TOTAL: &str = "hoard_cache_hits_total";

/// Total calls that missed the cache and invoked the method.
///
/// Labels: `method`.
pub const CACHE_MISSES_TOTAL: &str = "hoard_cache_misses_total";

/// Total calls that bypassed the cache entirely.
///
/// Labels: `method`, `reason`.
pub const CACHE_BYPASS_TOTAL: &str = "hoard_cache_bypass_total";

/// Total cache-layer failures swallowed by the engine.
///
/// Labels: `operation`.
pub const STORE_ERRORS_TOTAL: &str = "hoard_store_errors_total";

/// Total tag flush attempts.
///
/// Labels: `status`.
pub const TAG_FLUSHES_TOTAL: &str = "hoard_tag_flushes_total";
