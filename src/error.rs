//! Asset optimizer error types

/// Asset optimizer error types
///
/// Outcomes of the decision engine (quota reached, service unavailable, ...)
/// are not errors; they are reported through
/// [`OriginalReason`](crate::OriginalReason). This enum covers the failures
/// of the collaborators themselves.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    // Remote service errors
    #[error("HTTP error: {0}")]
    Http(String),

    // Storage errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no optimizer secret configured")]
    NotConfigured,
}

impl OptimizerError {
    /// Whether a later attempt could succeed without any change on our side.
    ///
    /// Network failures and I/O hiccups are transient; bad input and
    /// configuration problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, OptimizerError::Http(_) | OptimizerError::Io(_))
    }
}

impl From<reqwest::Error> for OptimizerError {
    fn from(err: reqwest::Error) -> Self {
        OptimizerError::Http(err.to_string())
    }
}

/// Result type alias for asset optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_io_are_transient() {
        assert!(OptimizerError::Http("timed out".into()).is_transient());
        let io = std::io::Error::other("disk");
        assert!(OptimizerError::Io(io).is_transient());
    }

    #[test]
    fn configuration_errors_are_permanent() {
        assert!(!OptimizerError::Configuration("bad".into()).is_transient());
        assert!(!OptimizerError::NotConfigured.is_transient());
        assert!(!OptimizerError::InvalidInput("..".into()).is_transient());
    }

    #[test]
    fn display_includes_detail() {
        let err = OptimizerError::InvalidInput("key escapes data root".into());
        assert_eq!(err.to_string(), "invalid input: key escapes data root");
    }
}
