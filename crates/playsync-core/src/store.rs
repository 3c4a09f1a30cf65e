//! File-backed progress store.
//!
//! Each media id gets its own directory under the cache root, named by a hash
//! of the id so arbitrary ids are safe on any filesystem. The record is a tiny
//! TOML file that every save overwrites.

use crate::persist::ProgressStore;
use crate::throttle::ProgressRecord;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CACHE_DIR: &str = ".cache";
const PROGRESS_FILE: &str = "progress.toml";

#[derive(Debug, Clone)]
pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hash_dir(&self, media_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(media_id.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    fn progress_path(&self, media_id: &str) -> PathBuf {
        self.hash_dir(media_id).join(PROGRESS_FILE)
    }

    /// Last saved progress for a media id, if a readable record exists.
    pub fn load_progress(&self, media_id: &str) -> Option<ProgressRecord> {
        let data = fs::read_to_string(self.progress_path(media_id)).ok()?;
        let record: ProgressRecord = toml::from_str(&data).ok()?;
        Some(record).filter(|record| record.media_id == media_id)
    }
}

impl Default for FileProgressStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

impl ProgressStore for FileProgressStore {
    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()> {
        let path = self.progress_path(&record.media_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating progress dir {}", parent.display()))?;
        }
        let contents = toml::to_string(record).context("Serializing progress record")?;
        fs::write(&path, contents)
            .with_context(|| format!("Writing progress file {}", path.display()))?;
        debug!(path = %path.display(), progress_sec = record.progress_sec, "Wrote progress file");
        Ok(())
    }
}
