use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::DataStore;
use crate::Result;

/// In-memory [`DataStore`].
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn append(&self, key: &str, data: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key.to_string()).or_default().push_str(data);
        Ok(())
    }
}
