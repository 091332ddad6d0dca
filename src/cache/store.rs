use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use super::record::{AssetId, Sentinel};
use crate::Result;
use crate::types::AssetType;

/// What a slot currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRecord {
    Sentinel(Sentinel),
    /// Optimized bytes are available at this path.
    Optimized(PathBuf),
}

/// Filesystem-backed cache record store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if needed.
    ///
    /// Every write depends on it, so callers propagate this failure.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Path of the optimized payload for `id`.
    pub fn payload_path(&self, id: &AssetId, asset_type: &AssetType) -> PathBuf {
        self.dir.join(format!("{id}.{asset_type}"))
    }

    /// Path of the sentinel marker for `id`.
    pub fn state_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(format!("{id}.state"))
    }

    /// Read the slot for `id`.
    ///
    /// A payload always wins over a marker. A marker that does not decode is
    /// logged and reported as absent so the next attempt overwrites it.
    pub async fn lookup(&self, id: &AssetId, asset_type: &AssetType) -> Result<Option<StoredRecord>> {
        let payload = self.payload_path(id, asset_type);
        match fs::metadata(&payload).await {
            Ok(meta) if meta.is_file() => return Ok(Some(StoredRecord::Optimized(payload))),
            Ok(_) => {}
            Err(e) if is_absent(&e) => {}
            Err(e) => return Err(e.into()),
        }

        let state_path = self.state_path(id);
        let raw = match fs::read(&state_path).await {
            Ok(raw) => raw,
            Err(e) if is_absent(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let decoded = std::str::from_utf8(&raw).ok().and_then(Sentinel::decode);
        if decoded.is_none() {
            warn!(
                asset = %id,
                path = %state_path.display(),
                len = raw.len(),
                "unreadable cache marker, treating slot as empty"
            );
        }
        Ok(decoded.map(StoredRecord::Sentinel))
    }

    /// Record a sentinel for `id`.
    pub async fn write_sentinel(&self, id: &AssetId, sentinel: Sentinel) -> Result<()> {
        let path = self.state_path(id);
        write_atomic(&path, sentinel.encode().as_bytes()).await?;
        debug!(asset = %id, sentinel = %sentinel, "wrote cache marker");
        Ok(())
    }

    /// Store optimized bytes for `id` and return the path to serve.
    ///
    /// Any earlier marker (a stale backoff) is removed.
    pub async fn write_optimized(
        &self,
        id: &AssetId,
        asset_type: &AssetType,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.payload_path(id, asset_type);
        write_atomic(&path, bytes).await?;
        match fs::remove_file(self.state_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(asset = %id, error = %e, "failed to remove stale cache marker"),
        }
        debug!(asset = %id, size = bytes.len(), "stored optimized asset");
        Ok(path)
    }
}

/// A missing cache directory (or a file in its place) means an empty slot;
/// creating the directory is where that problem gets reported.
fn is_absent(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Write via a sibling tmp file and rename, so readers never see a partial
/// record.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, bytes).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonthKey;
    use chrono::NaiveDate;

    fn png() -> AssetType {
        AssetType::from_path(Path::new("x.png"), &["png".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn absent_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let id = AssetId::from_path(Path::new("/a.png"));
        assert_eq!(store.lookup(&id, &png()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sentinel_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let id = AssetId::from_path(Path::new("/a.png"));

        for sentinel in [
            Sentinel::NoAction,
            Sentinel::DailyBackoff(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            Sentinel::MonthlyBackoff(MonthKey::new(2024, 2).unwrap()),
        ] {
            store.write_sentinel(&id, sentinel).await.unwrap();
            let raw = std::fs::read_to_string(store.state_path(&id)).unwrap();
            assert_eq!(raw, sentinel.encode());
            assert_eq!(
                store.lookup(&id, &png()).await.unwrap(),
                Some(StoredRecord::Sentinel(sentinel))
            );
        }
    }

    #[tokio::test]
    async fn eight_byte_payload_is_not_a_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let id = AssetId::from_path(Path::new("/tiny.png"));

        let path = store.write_optimized(&id, &png(), b"00000000").await.unwrap();
        assert_eq!(
            store.lookup(&id, &png()).await.unwrap(),
            Some(StoredRecord::Optimized(path.clone()))
        );
        assert_eq!(std::fs::read(path).unwrap(), b"00000000");
    }

    #[tokio::test]
    async fn optimized_write_clears_stale_backoff() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let id = AssetId::from_path(Path::new("/a.png"));

        let yesterday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store
            .write_sentinel(&id, Sentinel::DailyBackoff(yesterday))
            .await
            .unwrap();
        store.write_optimized(&id, &png(), b"optimized!").await.unwrap();

        assert!(!store.state_path(&id).exists());
        assert!(matches!(
            store.lookup(&id, &png()).await.unwrap(),
            Some(StoredRecord::Optimized(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_marker_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let id = AssetId::from_path(Path::new("/a.png"));
        std::fs::write(store.state_path(&id), "garbage!").unwrap();

        assert_eq!(store.lookup(&id, &png()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("a").join("b"));
        store.ensure_dir().await.unwrap();
        assert!(store.dir().is_dir());
    }
}
