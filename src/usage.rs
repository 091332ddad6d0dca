//! Monthly usage ledger.
//!
//! One counter per calendar month, stored as a decimal string under
//! `<prefix>/<YYYYMM>.usage`. A new month starts at zero simply because its
//! key has never been written. Counters only grow.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::Result;
use crate::clock::MonthKey;
use crate::storage::DataStore;

/// Per-month byte counters backed by a [`DataStore`].
///
/// [`add`](Self::add) is a read-modify-write on the store; increments are
/// serialized through an internal lock so concurrent callers in the same
/// process never lose an update.
pub struct UsageLedger {
    store: Arc<dyn DataStore>,
    prefix: String,
    write_lock: Mutex<()>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn DataStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Data store key for a month's counter.
    pub fn key(&self, month: MonthKey) -> String {
        format!("{}/{month}.usage", self.prefix)
    }

    /// Bytes counted for `month`; 0 when unset.
    ///
    /// An unparsable stored value also reads as 0 (and is logged), so a
    /// corrupted counter can never block optimization for the month.
    pub async fn get(&self, month: MonthKey) -> Result<u64> {
        let key = self.key(month);
        let Some(raw) = self.store.get_value(&key).await? else {
            return Ok(0);
        };
        Ok(parse_counter(&key, &raw))
    }

    /// Add `delta` bytes to `month`'s counter and return the new total.
    pub async fn add(&self, month: MonthKey, delta: u64) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let total = self.get(month).await?.saturating_add(delta);
        self.store
            .set_value(&self.key(month), &total.to_string())
            .await?;
        Ok(total)
    }
}

fn parse_counter(key: &str, raw: &str) -> u64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = trimmed, error = %e, "unparsable usage counter, treating as 0");
            0
        }
    }
}
