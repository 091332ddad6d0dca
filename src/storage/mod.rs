//! Key/value and append-only storage used by the usage ledger and audit log.
//!
//! The optimizer only needs three operations from the host's persistence
//! layer, captured by [`DataStore`]. Two implementations ship with the crate:
//!
//! - [`FileDataStore`]: one file per key under a root directory. Keys are
//!   relative paths such as `asset-optimizer/202403.usage`.
//! - [`MemoryDataStore`]: process-local map, for tests and ephemeral hosts.

mod file;
mod memory;

pub use file::FileDataStore;
pub use memory::MemoryDataStore;

use async_trait::async_trait;

use crate::Result;

/// Minimal persistence interface: string values and append-only logs.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key has never been written.
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Create or replace a value.
    async fn set_value(&self, key: &str, value: &str) -> Result<()>;

    /// Append `data` to the value at `key`, creating it if needed.
    async fn append(&self, key: &str, data: &str) -> Result<()>;
}
