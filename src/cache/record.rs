use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::clock::MonthKey;

/// Encoded length of every [`Sentinel`].
pub const SENTINEL_LEN: usize = 8;

const NO_ACTION: &str = "00000000";

/// Stable identity of an original asset, derived from its path only.
///
/// Lowercase hex SHA-256 of the path string; identical paths always map to
/// the same cache slot, and file content never affects the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetId(String);

impl AssetId {
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Control record stored in place of optimized bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Never attempt again (no-change or forbidden).
    NoAction,
    /// Retry no earlier than the day after this date.
    DailyBackoff(NaiveDate),
    /// Retry no earlier than the month after this one.
    MonthlyBackoff(MonthKey),
}

impl Sentinel {
    /// Eight-character on-disk form.
    pub fn encode(&self) -> String {
        match self {
            Sentinel::NoAction => NO_ACTION.to_string(),
            Sentinel::DailyBackoff(date) => date.format("%Y%m%d").to_string(),
            Sentinel::MonthlyBackoff(month) => format!("{month}00"),
        }
    }

    /// Parse the on-disk form; `None` for anything that is not a valid
    /// sentinel (wrong length, non-digits, impossible dates).
    pub fn decode(s: &str) -> Option<Self> {
        if s.len() != SENTINEL_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s == NO_ACTION {
            return Some(Sentinel::NoAction);
        }
        if let Some(month) = s.strip_suffix("00") {
            return MonthKey::parse(month).map(Sentinel::MonthlyBackoff);
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .map(Sentinel::DailyBackoff)
    }

    /// Whether this record still suppresses a remote attempt on `today`.
    ///
    /// Backoff windows hold while the stored stamp is not in the past, so a
    /// clock that moves backwards keeps serving the original.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self {
            Sentinel::NoAction => true,
            Sentinel::DailyBackoff(date) => today <= *date,
            Sentinel::MonthlyBackoff(month) => MonthKey::from(today) <= *month,
        }
    }

    /// Whether the record is permanent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Sentinel::NoAction)
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
