//! Asset request types

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Processing options requested by the asset pipeline (width, height, ...).
///
/// Opaque to the optimizer: they are recorded in the audit log verbatim and
/// never influence the decision.
pub type AssetOptions = BTreeMap<String, serde_json::Value>;

/// Declared asset type: the lowercased file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetType(String);

impl AssetType {
    /// Derive the type from a path's extension if it is in `supported`.
    ///
    /// Matching is case-insensitive; `supported` entries are expected in
    /// lowercase (the configuration normalises them).
    pub fn from_path(path: &Path, supported: &[String]) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        supported.iter().any(|s| *s == ext).then_some(Self(ext))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invocation of the asset-serving hook.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    /// Resolved path of the original file.
    pub source: PathBuf,
    /// Logical filename the client asked for.
    pub filename: String,
    /// Requested processing options.
    pub options: AssetOptions,
}

impl AssetRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            filename: String::new(),
            options: AssetOptions::new(),
        }
    }

    /// Set the logical filename.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the processing options.
    pub fn options(mut self, options: AssetOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a single processing option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
