//! Provider trait for the remote optimization service.
//!
//! # Error semantics
//!
//! - `Err(_)` means the service could not be reached or its response could
//!   not be read (transport failure, timeout, truncated body). The engine
//!   records a daily backoff.
//! - `Ok(response)` means the service answered; its verdict is in
//!   [`OptimizeResponse::result`], including verdicts the engine does not
//!   recognise ([`OptimizationResult::Unknown`]).

use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::types::AssetType;

/// Remote image optimization capability.
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Submit the original bytes and return the service's verdict.
    async fn optimize(
        &self,
        content: Vec<u8>,
        asset_type: &AssetType,
        quality: &str,
    ) -> Result<OptimizeResponse>;
}

/// Verdict carried by the service's result header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizationResult {
    /// Body holds the optimized asset.
    Ok,
    /// Nothing to gain; keep the original.
    NoChange,
    /// Service refuses this asset (e.g. account or content policy).
    Forbidden,
    /// Missing or unrecognised header value.
    Unknown(String),
}

impl OptimizationResult {
    /// Interpret a raw header value (case-insensitive, whitespace-trimmed).
    /// A missing header becomes `Unknown("unknown")`.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return OptimizationResult::Unknown("unknown".to_string());
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" => OptimizationResult::Ok,
            "no-change" => OptimizationResult::NoChange,
            "forbidden" => OptimizationResult::Forbidden,
            "" => OptimizationResult::Unknown("unknown".to_string()),
            other => OptimizationResult::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationResult::Ok => f.write_str("ok"),
            OptimizationResult::NoChange => f.write_str("no-change"),
            OptimizationResult::Forbidden => f.write_str("forbidden"),
            OptimizationResult::Unknown(value) => f.write_str(value),
        }
    }
}

/// A response from the optimization service.
#[derive(Debug, Clone)]
pub struct OptimizeResponse {
    pub result: OptimizationResult,
    /// Free-text diagnostics from the details header.
    pub details: String,
    /// Optimized bytes; only meaningful when `result` is `Ok`.
    pub body: Vec<u8>,
    /// Status line and headers as received, for the audit log.
    pub raw: String,
}

impl OptimizeResponse {
    pub fn new(result: OptimizationResult) -> Self {
        Self {
            result,
            details: String::new(),
            body: Vec::new(),
            raw: String::new(),
        }
    }

    /// An `ok` response carrying optimized bytes.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(OptimizationResult::Ok).body(body)
    }

    pub fn no_change() -> Self {
        Self::new(OptimizationResult::NoChange)
    }

    pub fn forbidden() -> Self {
        Self::new(OptimizationResult::Forbidden)
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }
}
