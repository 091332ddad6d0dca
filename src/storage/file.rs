use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::DataStore;
use crate::{OptimizerError, Result};

/// Directory-backed [`DataStore`]: each key is a file path relative to `root`.
#[derive(Debug, Clone)]
pub struct FileDataStore {
    root: PathBuf,
}

impl FileDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path below the root, rejecting anything that would
    /// escape it.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(OptimizerError::InvalidInput(format!(
                "data key must be a relative path without '..': {key:?}"
            )));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for FileDataStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        Self::ensure_parent(&path).await?;

        // Write to tmp file first, then rename for atomicity
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, value).await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn append(&self, key: &str, data: &str) -> Result<()> {
        let path = self.key_path(key)?;
        Self::ensure_parent(&path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(data.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
