//! Optimizer configuration.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` / explicit path (must exist)
//! 2. `<config dir>/asset-optimizer/config.toml` (user, e.g. `~/.config`)
//! 3. `/etc/asset-optimizer/config.toml` (system)
//! 4. built-in defaults
//!
//! The service secret may be left out of the file and supplied through the
//! `ASSET_OPTIMIZER_SECRET` environment variable instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{OptimizerError, Result};

/// Default optimization service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://asset-optimizer.bearcms.com/";

/// Environment variable consulted when no secret is configured.
pub const SECRET_ENV_VAR: &str = "ASSET_OPTIMIZER_SECRET";

/// Monthly quota of original bytes sent to the service: 500 MiB.
pub const DEFAULT_MONTHLY_LIMIT_BYTES: u64 = 500 * 1024 * 1024;

/// Optimizer configuration.
///
/// ```rust
/// # use asset_optimizer::OptimizerConfig;
/// let config = OptimizerConfig::new()
///     .secret("s3cr3t")
///     .monthly_limit_bytes(100 * 1024 * 1024)
///     .timeout_secs(10);
/// assert!(config.is_supported("PNG"));
/// assert!(!config.is_supported("webp"));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Optimization service URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Shared secret; only its SHA-256 digest is ever sent.
    #[serde(default)]
    pub secret: Option<String>,
    /// Original bytes allowed per calendar month (default: 500 MiB).
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit_bytes: u64,
    /// Quality level requested from the service (default: "auto").
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Extensions eligible for optimization (default: png, jpg, jpeg, gif).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Remote call timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Directory holding cache records and optimized files.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Root of the file-backed data store (usage counters, audit logs).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Namespace for usage and audit keys in the data store.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            secret: None,
            monthly_limit_bytes: default_monthly_limit(),
            quality: default_quality(),
            extensions: default_extensions(),
            timeout_secs: default_timeout(),
            cache_dir: default_cache_dir(),
            data_dir: default_data_dir(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_monthly_limit() -> u64 {
    DEFAULT_MONTHLY_LIMIT_BYTES
}

fn default_quality() -> String {
    "auto".to_string()
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif"].map(String::from).to_vec()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("asset-optimizer")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join("asset-optimizer")
}

fn default_key_prefix() -> String {
    "asset-optimizer".to_string()
}

impl OptimizerConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the shared secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the monthly quota in bytes.
    pub fn monthly_limit_bytes(mut self, bytes: u64) -> Self {
        self.monthly_limit_bytes = bytes;
        self
    }

    /// Set the quality level sent to the service.
    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Replace the supported extension set.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the remote call timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the cache directory.
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = path.into();
        self
    }

    /// Set the data store directory.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Set the key namespace for usage counters and audit logs.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Remote call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether files with this extension are eligible (case-insensitive).
    pub fn is_supported(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Extensions in lowercase, as matched by [`AssetType`](crate::AssetType).
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }

    /// Configured secret, falling back to `ASSET_OPTIMIZER_SECRET`.
    pub fn resolved_secret(&self) -> Option<String> {
        self.secret
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var(SECRET_ENV_VAR).ok().filter(|s| !s.is_empty()))
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(OptimizerError::Configuration(
                "at least one extension must be supported".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(OptimizerError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.key_prefix.trim_matches('/').is_empty() {
            return Err(OptimizerError::Configuration(
                "key_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| OptimizerError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; an error if missing)
    /// 2. `<config dir>/asset-optimizer/config.toml`
    /// 3. `/etc/asset-optimizer/config.toml`
    /// 4. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            OptimizerError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            OptimizerError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, `None` when no file exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(OptimizerError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(dir) = dirs::config_dir() {
            let user_config = dir.join("asset-optimizer").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/asset-optimizer/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = OptimizerConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.monthly_limit_bytes, 524_288_000);
        assert_eq!(config.quality, "auto");
        assert_eq!(config.extensions, vec!["png", "jpg", "jpeg", "gif"]);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.key_prefix, "asset-optimizer");
        assert!(config.secret.is_none());
    }

    #[test]
    fn parse_minimal_config() {
        let config = OptimizerConfig::from_toml(r#"secret = "abc""#).unwrap();
        assert_eq!(config.secret.as_deref(), Some("abc"));
        // Defaults preserved
        assert_eq!(config.quality, "auto");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            endpoint = "http://localhost:8080/"
            secret = "abc"
            monthly_limit_bytes = 1024
            quality = "high"
            extensions = ["png", "webp"]
            timeout_secs = 5
            cache_dir = "/var/cache/ao"
            data_dir = "/var/lib/ao"
            key_prefix = "tenant-7"
        "#;
        let config = OptimizerConfig::from_toml(toml).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/");
        assert_eq!(config.monthly_limit_bytes, 1024);
        assert_eq!(config.quality, "high");
        assert!(config.is_supported("webp"));
        assert!(!config.is_supported("gif"));
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/ao"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ao"));
        assert_eq!(config.key_prefix, "tenant-7");
    }

    #[test]
    fn normalized_extensions_lowercase_and_strip_dot() {
        let config = OptimizerConfig::new().extensions([".PNG", "Jpg"]);
        assert_eq!(config.normalized_extensions(), vec!["png", "jpg"]);
    }

    #[test]
    fn explicit_config_not_found_returns_error() {
        let result = OptimizerConfig::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "quality = \"low\"\ntimeout_secs = 7\n").unwrap();

        let config = OptimizerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.quality, "low");
        assert_eq!(config.timeout_secs, 7);
    }

    #[test]
    fn explicit_secret_wins_over_env() {
        let config = OptimizerConfig::new().secret("from-config");
        assert_eq!(config.resolved_secret().as_deref(), Some("from-config"));
    }

    #[test]
    fn validate_rejects_empty_extensions() {
        let config = OptimizerConfig::new().extensions(Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        assert!(OptimizerConfig::new().timeout_secs(0).validate().is_err());
        assert!(OptimizerConfig::new().validate().is_ok());
    }
}
