//! Asset optimizer - lazy, memoizing optimization cache for image assets
//!
//! This crate sits between an asset pipeline and a remote image-compression
//! service. For every requested image it decides whether to serve the
//! original file or an optimized copy, calls the service at most once per
//! asset on first request, and memoizes every outcome (including failures,
//! with a daily or monthly backoff) in a local cache directory. A monthly
//! byte quota caps how much is sent to the service, and every attempt is
//! written to a month-scoped audit log.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use asset_optimizer::{AssetOptimizer, AssetOptions, OptimizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> asset_optimizer::Result<()> {
//!     let optimizer = AssetOptimizer::builder()
//!         .config(
//!             OptimizerConfig::new()
//!                 .secret("s3cr3t")
//!                 .cache_dir("/var/cache/site/asset-optimizer")
//!                 .data_dir("/var/lib/site"),
//!         )
//!         .build()?;
//!
//!     let served = optimizer
//!         .decide(
//!             Some(Path::new("/srv/site/images/hero.jpg")),
//!             "images/hero.jpg",
//!             &AssetOptions::new(),
//!         )
//!         .await?;
//!
//!     match served {
//!         Some(path) => println!("serve optimized copy at {}", path.display()),
//!         None => println!("serve the original"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod providers;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod usage;
pub mod version;

// Re-export main types at crate root
pub use audit::{AuditEntry, AuditLog, AuditStatus};
pub use cache::{AssetId, RecordStore, Sentinel, StoredRecord};
pub use clock::{Clock, FixedClock, MonthKey, SystemClock};
pub use config::OptimizerConfig;
pub use engine::{AssetOptimizer, AssetOptimizerBuilder};
pub use error::{OptimizerError, Result};
pub use providers::{HttpOptimizer, OptimizationResult, OptimizeResponse, Optimizer};
pub use storage::{DataStore, FileDataStore, MemoryDataStore};
pub use types::{AssetOptions, AssetRequest, AssetType, Decision, OriginalReason};
pub use usage::UsageLedger;
pub use version::{PKG_VERSION, version_string};
