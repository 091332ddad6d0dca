//! Telemetry metric name constants.
//!
//! Centralised metric names for asset optimizer operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `asset_optimizer_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `outcome`: what was served: "optimized" or "original"
//! - `reason`: why the original was served (e.g. "backed-off", "quota-exceeded")
//! - `status`: remote outcome as written to the audit log (e.g. "ok", "unavailable")

/// Total decisions returned by the engine.
///
/// Labels: `outcome` ("optimized" | "original"), `reason`.
pub const DECISIONS_TOTAL: &str = "asset_optimizer_decisions_total";

/// Total calls made to the remote optimization service.
///
/// Labels: `status` ("ok" | "no-change" | "forbidden" | "unavailable").
pub const REMOTE_REQUESTS_TOTAL: &str = "asset_optimizer_remote_requests_total";

/// Remote call duration in seconds.
pub const REMOTE_DURATION_SECONDS: &str = "asset_optimizer_remote_duration_seconds";

/// Cache record lookups that produced a decision without a remote call.
pub const CACHE_HITS_TOTAL: &str = "asset_optimizer_cache_hits_total";

/// Cache record lookups that fell through to the quota gate.
pub const CACHE_MISSES_TOTAL: &str = "asset_optimizer_cache_misses_total";

/// Original bytes counted against the monthly quota.
pub const BYTES_PROCESSED_TOTAL: &str = "asset_optimizer_bytes_processed_total";
