//! Engine decisions

use std::fmt;
use std::path::PathBuf;

/// What the asset pipeline should serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Serve the optimized replacement at this path instead of the original.
    Optimized(PathBuf),
    /// Serve the original file unchanged.
    Original(OriginalReason),
}

impl Decision {
    /// Collapse to the hook contract: `Some(path)` overrides the original.
    pub fn into_override(self) -> Option<PathBuf> {
        match self {
            Decision::Optimized(path) => Some(path),
            Decision::Original(_) => None,
        }
    }

    pub fn is_optimized(&self) -> bool {
        matches!(self, Decision::Optimized(_))
    }

    /// Metric label for the `outcome` dimension.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Decision::Optimized(_) => "optimized",
            Decision::Original(_) => "original",
        }
    }

    /// Metric label for the `reason` dimension.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Decision::Optimized(_) => "optimized",
            Decision::Original(reason) => reason.as_str(),
        }
    }
}

/// Why the original asset is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginalReason {
    /// Extension is not in the supported set.
    Unsupported,
    /// A permanent no-action record exists (earlier no-change or forbidden).
    NoAction,
    /// A daily or monthly backoff record is still in effect.
    BackedOff,
    /// The monthly quota is exhausted; a monthly backoff was recorded.
    QuotaExceeded,
    /// The remote call failed or returned an unrecognised result.
    Unavailable,
    /// The service refused to optimize this asset.
    Forbidden,
    /// The service found nothing to improve.
    NoChange,
    /// The original file could not be read.
    SourceUnreadable,
    /// The cache record could not be read or written.
    StoreUnavailable,
}

impl OriginalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginalReason::Unsupported => "unsupported",
            OriginalReason::NoAction => "no-action",
            OriginalReason::BackedOff => "backed-off",
            OriginalReason::QuotaExceeded => "quota-exceeded",
            OriginalReason::Unavailable => "unavailable",
            OriginalReason::Forbidden => "forbidden",
            OriginalReason::NoChange => "no-change",
            OriginalReason::SourceUnreadable => "source-unreadable",
            OriginalReason::StoreUnavailable => "store-unavailable",
        }
    }
}

impl fmt::Display for OriginalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_has_no_override() {
        assert_eq!(
            Decision::Original(OriginalReason::BackedOff).into_override(),
            None
        );
    }

    #[test]
    fn optimized_overrides_with_path() {
        let d = Decision::Optimized(PathBuf::from("/cache/abc.png"));
        assert!(d.is_optimized());
        assert_eq!(d.into_override(), Some(PathBuf::from("/cache/abc.png")));
    }

    #[test]
    fn labels() {
        assert_eq!(
            Decision::Original(OriginalReason::QuotaExceeded).reason_label(),
            "quota-exceeded"
        );
        assert_eq!(
            Decision::Optimized(PathBuf::new()).outcome_label(),
            "optimized"
        );
    }
}
