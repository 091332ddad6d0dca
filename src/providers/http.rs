//! HTTP client for the remote optimization service.
//!
//! Protocol: `POST <endpoint>` with a multipart form whose `content` field
//! carries the original bytes. Parameters travel in headers:
//!
//! | header                | value                               |
//! |-----------------------|-------------------------------------|
//! | `x-optimizer-secret`  | SHA-256 hex digest of the secret    |
//! | `x-optimizer-quality` | requested quality (e.g. `auto`)     |
//! | `x-optimizer-type`    | lowercase extension (e.g. `png`)    |
//!
//! The verdict comes back in `x-optimizer-result`, diagnostics in
//! `x-optimizer-details`, and on `ok` the body is the optimized file. The
//! HTTP status code is not interpreted: the result header alone decides.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use sha2::{Digest, Sha256};

use super::traits::{OptimizationResult, OptimizeResponse, Optimizer};
use crate::config::OptimizerConfig;
use crate::types::AssetType;
use crate::version;
use crate::{OptimizerError, Result};

pub const SECRET_HEADER: &str = "x-optimizer-secret";
pub const QUALITY_HEADER: &str = "x-optimizer-quality";
pub const TYPE_HEADER: &str = "x-optimizer-type";
pub const RESULT_HEADER: &str = "x-optimizer-result";
pub const DETAILS_HEADER: &str = "x-optimizer-details";

/// Derive the credential sent on the wire; the raw secret never leaves
/// the process.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Client for the optimization service.
#[derive(Clone)]
pub struct HttpOptimizer {
    http: Client,
    endpoint: String,
    credential: String,
}

impl HttpOptimizer {
    /// Create a client for `endpoint` with the given shared secret.
    pub fn new(
        endpoint: impl Into<String>,
        secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(version::user_agent())
            .build()
            .map_err(|e| {
                OptimizerError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credential: hash_secret(secret),
        })
    }

    /// Create a client from configuration. Fails with
    /// [`OptimizerError::NotConfigured`] when no secret is available.
    pub fn from_config(config: &OptimizerConfig) -> Result<Self> {
        let secret = config
            .resolved_secret()
            .ok_or(OptimizerError::NotConfigured)?;
        Self::new(config.endpoint.clone(), &secret, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Optimizer for HttpOptimizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn optimize(
        &self,
        content: Vec<u8>,
        asset_type: &AssetType,
        quality: &str,
    ) -> Result<OptimizeResponse> {
        let form = Form::new().part("content", Part::bytes(content));

        let response = self
            .http
            .post(&self.endpoint)
            .header(SECRET_HEADER, &self.credential)
            .header(QUALITY_HEADER, quality)
            .header(TYPE_HEADER, asset_type.as_str())
            .multipart(form)
            .send()
            .await?;

        let raw = describe_head(response.status(), response.headers());
        let result = OptimizationResult::parse(header_str(response.headers(), RESULT_HEADER));
        let details = header_str(response.headers(), DETAILS_HEADER)
            .map(|d| d.trim().to_string())
            .unwrap_or_default();

        // Only an `ok` body is used, but reading it for every verdict means a
        // truncated transfer surfaces as a transport error either way.
        let body = response.bytes().await?.to_vec();

        Ok(OptimizeResponse {
            result,
            details,
            body,
            raw,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Status line plus headers, one per line, for the audit trail.
fn describe_head(status: reqwest::StatusCode, headers: &HeaderMap) -> String {
    let mut out = format!("HTTP {status}");
    for (name, value) in headers {
        let _ = write!(
            out,
            "\n{name}: {}",
            value.to_str().unwrap_or("<binary>")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_hashed() {
        let hashed = hash_secret("s3cr3t");
        assert_ne!(hashed, "s3cr3t");
        assert_eq!(hashed.len(), 64);
        assert_eq!(hashed, hash_secret("s3cr3t"));
    }

    #[test]
    fn from_config_requires_secret() {
        let config = OptimizerConfig::new().secret("");
        // An empty configured secret only resolves through the env var.
        if std::env::var(crate::config::SECRET_ENV_VAR).is_err() {
            assert!(matches!(
                HttpOptimizer::from_config(&config),
                Err(OptimizerError::NotConfigured)
            ));
        }
    }

    #[test]
    fn from_config_uses_endpoint() {
        let config = OptimizerConfig::new()
            .secret("x")
            .endpoint("http://127.0.0.1:1/");
        let client = HttpOptimizer::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/");
    }
}
