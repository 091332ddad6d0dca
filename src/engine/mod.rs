//! Optimization decision engine.
//!
//! [`AssetOptimizer`] answers one question per request: serve the original
//! file, serve a cached optimized copy, or call the remote service first.
//!
//! ```text
//!   unsupported extension ───────────────────────────────► original
//!   slot: optimized ─────────────────────────────────────► cached path
//!   slot: no-action / backoff still active ──────────────► original
//!   slot: absent / backoff expired
//!     └─ usage > limit ── write monthly backoff ─────────► original
//!     └─ remote call
//!          ok          ── store bytes, count usage ──────► optimized path
//!            store failed ── daily backoff ──────────────► original
//!          no-change   ── no-action, count usage ────────► original
//!          forbidden   ── no-action ─────────────────────► original
//!          error/other ── daily backoff ─────────────────► original
//! ```
//!
//! Every branch below the quota gate appends one audit entry. The whole
//! slow path runs under a per-identity lock and re-reads the slot once the
//! lock is held, so concurrent first requests for one asset produce a
//! single remote call.

mod builder;

pub use builder::AssetOptimizerBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::Result;
use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::cache::{AssetId, InFlight, RecordStore, Sentinel, StoredRecord};
use crate::clock::{Clock, MonthKey};
use crate::config::OptimizerConfig;
use crate::providers::{OptimizationResult, OptimizeResponse, Optimizer};
use crate::telemetry;
use crate::types::{AssetOptions, AssetRequest, AssetType, Decision, OriginalReason};
use crate::usage::UsageLedger;

/// The decision engine. Cheap to share behind an `Arc`.
pub struct AssetOptimizer {
    config: OptimizerConfig,
    extensions: Vec<String>,
    records: RecordStore,
    usage: UsageLedger,
    audit: AuditLog,
    optimizer: Arc<dyn Optimizer>,
    clock: Arc<dyn Clock>,
    flights: InFlight,
}

/// Per-request context carried through the slow path.
struct Attempt<'a> {
    request: &'a AssetRequest,
    id: AssetId,
    asset_type: AssetType,
    month: MonthKey,
    target: PathBuf,
}

impl AssetOptimizer {
    /// Create a new builder.
    pub fn builder() -> AssetOptimizerBuilder {
        AssetOptimizerBuilder::new()
    }

    pub(crate) fn new(
        config: OptimizerConfig,
        optimizer: Arc<dyn Optimizer>,
        store: Arc<dyn crate::storage::DataStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let extensions = config.normalized_extensions();
        let records = RecordStore::new(config.cache_dir.clone());
        let usage = UsageLedger::new(store.clone(), config.key_prefix.clone());
        let audit = AuditLog::new(store, config.key_prefix.clone());
        Self {
            config,
            extensions,
            records,
            usage,
            audit,
            optimizer,
            clock,
            flights: InFlight::new(),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn usage(&self) -> &UsageLedger {
        &self.usage
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Supported asset type of `path`, if any.
    pub fn asset_type(&self, path: &Path) -> Option<AssetType> {
        AssetType::from_path(path, &self.extensions)
    }

    /// Asset-pipeline hook.
    ///
    /// `source` is the resolved original path (`None` means there is nothing
    /// to serve and the call is a no-op). Returns the path to serve instead
    /// of the original, or `None` to serve the original unchanged.
    ///
    /// Only a failure to create the cache directory is reported as an error.
    pub async fn decide(
        &self,
        source: Option<&Path>,
        filename: &str,
        options: &AssetOptions,
    ) -> Result<Option<PathBuf>> {
        let Some(source) = source else {
            return Ok(None);
        };
        let request = AssetRequest::new(source)
            .filename(filename)
            .options(options.clone());
        Ok(self.prepare(&request).await?.into_override())
    }

    /// Decide what to serve for `request`, calling the service if needed.
    pub async fn prepare(&self, request: &AssetRequest) -> Result<Decision> {
        let decision = self.resolve(request).await?;
        metrics::counter!(
            telemetry::DECISIONS_TOTAL,
            "outcome" => decision.outcome_label(),
            "reason" => decision.reason_label()
        )
        .increment(1);
        Ok(decision)
    }

    async fn resolve(&self, request: &AssetRequest) -> Result<Decision> {
        let Some(asset_type) = self.asset_type(&request.source) else {
            return Ok(Decision::Original(OriginalReason::Unsupported));
        };
        let id = AssetId::from_path(&request.source);

        // Fast path: most requests hit a settled slot and never take the lock.
        if let Some(decision) = self.settled(&id, &asset_type).await {
            return Ok(decision);
        }

        let _guard = self.flights.acquire(&id).await;
        if let Some(decision) = self.settled(&id, &asset_type).await {
            return Ok(decision);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        self.records.ensure_dir().await?;

        let attempt = Attempt {
            request,
            target: self.records.payload_path(&id, &asset_type),
            month: self.clock.this_month(),
            id,
            asset_type,
        };

        let used = match self.usage.get(attempt.month).await {
            Ok(used) => used,
            Err(e) => {
                warn!(asset = %attempt.id, error = %e, "failed to read usage, assuming none");
                0
            }
        };
        if used > self.config.monthly_limit_bytes {
            info!(
                asset = %attempt.id,
                used,
                limit = self.config.monthly_limit_bytes,
                "monthly limit reached"
            );
            self.write_sentinel(&attempt.id, Sentinel::MonthlyBackoff(attempt.month))
                .await;
            self.log(&attempt, AuditStatus::LimitReached, String::new())
                .await;
            return Ok(Decision::Original(OriginalReason::QuotaExceeded));
        }

        Ok(self.attempt(&attempt).await)
    }

    /// Decision implied by the current slot, or `None` when a remote attempt
    /// is due (absent slot or expired backoff).
    async fn settled(&self, id: &AssetId, asset_type: &AssetType) -> Option<Decision> {
        let record = match self.records.lookup(id, asset_type).await {
            Ok(record) => record,
            Err(e) => {
                warn!(asset = %id, error = %e, "failed to read cache record");
                return Some(Decision::Original(OriginalReason::StoreUnavailable));
            }
        };
        let decision = match record? {
            StoredRecord::Optimized(path) => Decision::Optimized(path),
            StoredRecord::Sentinel(sentinel) if sentinel.is_active(self.clock.today()) => {
                if sentinel.is_terminal() {
                    Decision::Original(OriginalReason::NoAction)
                } else {
                    Decision::Original(OriginalReason::BackedOff)
                }
            }
            StoredRecord::Sentinel(sentinel) => {
                debug!(asset = %id, sentinel = %sentinel, "backoff expired");
                return None;
            }
        };
        debug!(asset = %id, decision = decision.reason_label(), "cache hit");
        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        Some(decision)
    }

    /// Call the service and persist its verdict.
    async fn attempt(&self, attempt: &Attempt<'_>) -> Decision {
        let content = match tokio::fs::read(&attempt.request.source).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    asset = %attempt.id,
                    path = %attempt.request.source.display(),
                    error = %e,
                    "failed to read original asset"
                );
                return Decision::Original(OriginalReason::SourceUnreadable);
            }
        };
        let original_size = content.len() as u64;

        let started = Instant::now();
        let outcome = self
            .optimizer
            .optimize(content, &attempt.asset_type, &self.config.quality)
            .await;
        metrics::histogram!(telemetry::REMOTE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                return self
                    .unavailable(attempt, format!("error: {e}"))
                    .await;
            }
        };
        let OptimizeResponse {
            result,
            details,
            body,
            raw,
        } = response;

        debug!(
            asset = %attempt.id,
            provider = self.optimizer.name(),
            result = %result,
            "service verdict"
        );

        match result {
            OptimizationResult::Ok => self.optimized(attempt, body, details, original_size).await,
            OptimizationResult::NoChange => {
                self.write_sentinel(&attempt.id, Sentinel::NoAction).await;
                self.record_verdict(attempt, AuditStatus::NoChange, details, original_size)
                    .await;
                Decision::Original(OriginalReason::NoChange)
            }
            OptimizationResult::Forbidden => {
                info!(
                    asset = %attempt.id,
                    provider = self.optimizer.name(),
                    details = %details,
                    "optimization refused"
                );
                self.write_sentinel(&attempt.id, Sentinel::NoAction).await;
                self.record_verdict(attempt, AuditStatus::Forbidden, details, original_size)
                    .await;
                Decision::Original(OriginalReason::Forbidden)
            }
            OptimizationResult::Unknown(value) => {
                let info = format!("{raw}, error: unknown result '{value}'");
                self.unavailable(attempt, info).await
            }
        }
    }

    async fn optimized(
        &self,
        attempt: &Attempt<'_>,
        body: Vec<u8>,
        details: String,
        original_size: u64,
    ) -> Decision {
        info!(
            asset = %attempt.id,
            provider = self.optimizer.name(),
            original = original_size,
            optimized = body.len(),
            "asset optimized"
        );
        let stored = self
            .records
            .write_optimized(&attempt.id, &attempt.asset_type, &body)
            .await;
        self.record_verdict(attempt, AuditStatus::Ok, details, original_size)
            .await;
        match stored {
            Ok(path) => Decision::Optimized(path),
            Err(e) => {
                warn!(asset = %attempt.id, error = %e, "failed to store optimized asset");
                self.write_sentinel(&attempt.id, Sentinel::DailyBackoff(self.clock.today()))
                    .await;
                Decision::Original(OriginalReason::StoreUnavailable)
            }
        }
    }

    async fn unavailable(&self, attempt: &Attempt<'_>, info: String) -> Decision {
        self.remote_outcome(AuditStatus::Unavailable);
        warn!(
            asset = %attempt.id,
            provider = self.optimizer.name(),
            info = %info,
            "optimization service unavailable"
        );
        self.write_sentinel(&attempt.id, Sentinel::DailyBackoff(self.clock.today()))
            .await;
        self.log(attempt, AuditStatus::Unavailable, info).await;
        Decision::Original(OriginalReason::Unavailable)
    }

    fn remote_outcome(&self, status: AuditStatus) {
        metrics::counter!(telemetry::REMOTE_REQUESTS_TOTAL, "status" => status.as_str())
            .increment(1);
    }

    /// Marker writes are best effort: on failure the slot stays as it was
    /// and the next request simply retries.
    async fn write_sentinel(&self, id: &AssetId, sentinel: Sentinel) {
        if let Err(e) = self.records.write_sentinel(id, sentinel).await {
            warn!(asset = %id, sentinel = %sentinel, error = %e, "failed to write cache marker");
        }
    }

    /// Record a verdict the service returned: metrics, audit entry and, for
    /// transfers that count, the original size against the monthly quota.
    async fn record_verdict(
        &self,
        attempt: &Attempt<'_>,
        status: AuditStatus,
        details: String,
        original_size: u64,
    ) {
        self.remote_outcome(status);
        self.log(attempt, status, details).await;
        if status.counts_usage() {
            self.count_usage(attempt, original_size).await;
        }
    }

    async fn count_usage(&self, attempt: &Attempt<'_>, bytes: u64) {
        match self.usage.add(attempt.month, bytes).await {
            Ok(total) => {
                metrics::counter!(telemetry::BYTES_PROCESSED_TOTAL).increment(bytes);
                debug!(month = %attempt.month, total, "usage updated");
            }
            Err(e) => warn!(month = %attempt.month, error = %e, "failed to update usage"),
        }
    }

    async fn log(&self, attempt: &Attempt<'_>, status: AuditStatus, info: String) {
        let entry = AuditEntry {
            status,
            info,
            filename: attempt.request.filename.clone(),
            options: attempt.request.options.clone(),
            source: attempt.request.source.display().to_string(),
            target: attempt.target.display().to_string(),
        };
        self.audit.append(attempt.month, &entry).await;
    }
}
