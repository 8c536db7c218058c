use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use crate::StoreError;

/// Gzip-compressed bincode image of the embedded store
///
/// Writes go to a temp file that is renamed over the snapshot, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` when there is nothing usable on disk.
    ///
    /// An undecodable snapshot is copied aside to `*.bak` before starting empty.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Snapshot file does not exist, starting empty");
            return Ok(None);
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.path)?;
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decompressed = Vec::new();

        let decoded = decoder
            .read_to_end(&mut decompressed)
            .map_err(StoreError::from)
            .and_then(|_| deserialize::<T>(&decompressed).map_err(StoreError::from));

        match decoded {
            Ok(value) => {
                info!(
                    path = %self.path.display(),
                    bytes = data.len(),
                    "Loaded store snapshot in {:?}",
                    start.elapsed()
                );
                Ok(Some(value))
            }
            Err(e) => {
                let backup_path = self.path.with_extension("bin.bak");
                if let Err(backup_err) = std::fs::copy(&self.path, &backup_path) {
                    warn!(
                        "Failed to back up unreadable snapshot: {}. Starting with an empty store.",
                        backup_err
                    );
                } else {
                    warn!(
                        "Snapshot unreadable (error: {}). Backed up to {:?} and starting with an empty store.",
                        e, backup_path
                    );
                }
                Ok(None)
            }
        }
    }

    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        let serialized = serialize(value)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        Ok(encoder.finish()?)
    }

    pub async fn write(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote store snapshot");
        Ok(())
    }
}
