//! Month-scoped audit log of optimization attempts.
//!
//! Every request that reaches the quota gate produces exactly one entry,
//! appended as a JSON object followed by `,\n` to
//! `<prefix>/<YYYYMM>.json.log`. Wrapping a month's file in `[` ... `]`
//! (after dropping the final comma) yields a JSON array.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;
use crate::clock::MonthKey;
use crate::storage::DataStore;
use crate::types::AssetOptions;

/// Outcome recorded for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditStatus {
    Ok,
    NoChange,
    Forbidden,
    LimitReached,
    Unavailable,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "ok",
            AuditStatus::NoChange => "no-change",
            AuditStatus::Forbidden => "forbidden",
            AuditStatus::LimitReached => "limit-reached",
            AuditStatus::Unavailable => "unavailable",
        }
    }

    /// Whether the original bytes were transferred and count against quota.
    pub fn counts_usage(&self) -> bool {
        matches!(self, AuditStatus::Ok | AuditStatus::NoChange)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub status: AuditStatus,
    /// Service details, or error text for `unavailable`.
    pub info: String,
    /// Logical filename requested by the client.
    pub filename: String,
    pub options: AssetOptions,
    /// Original file path.
    pub source: String,
    /// Cache slot path.
    pub target: String,
}

/// Append-only audit log backed by a [`DataStore`].
pub struct AuditLog {
    store: Arc<dyn DataStore>,
    prefix: String,
}

impl AuditLog {
    pub fn new(store: Arc<dyn DataStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Data store key for a month's log.
    pub fn key(&self, month: MonthKey) -> String {
        format!("{}/{month}.json.log", self.prefix)
    }

    /// Append an entry. Best effort: failures are logged and swallowed.
    pub async fn append(&self, month: MonthKey, entry: &AuditEntry) {
        let key = self.key(month);
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json},\n"),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize audit entry");
                return;
            }
        };
        if let Err(e) = self.store.append(&key, &line).await {
            warn!(key = %key, status = %entry.status, error = %e, "failed to append audit entry");
        }
    }

    /// All entries recorded for `month`, oldest first.
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub async fn entries(&self, month: MonthKey) -> Result<Vec<AuditEntry>> {
        let key = self.key(month);
        let Some(content) = self.store.get_value(&key).await? else {
            return Ok(Vec::new());
        };
        let entries = content
            .lines()
            .map(|line| line.trim().trim_end_matches(','))
            .filter(|line| !line.is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping corrupt audit line");
                    None
                }
            })
            .collect();
        Ok(entries)
    }
}
