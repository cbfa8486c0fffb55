//! Profile Store: durable home of the single Profile record.
//!
//! The backing storage is a key-value area (a JSON object of namespaced
//! keys). The profile lives under one fixed key and every save rewrites the
//! whole record; callers merge locally before saving.
//!
//! When no storage is available the `NullProfileStore` stands in: loads
//! return defaults and saves do nothing, so the panel keeps working in memory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::Profile;

/// Namespaced key of the profile record inside the storage area.
pub const PROFILE_KEY: &str = "jobAssistant.profile";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the stored profile, or an all-empty one if nothing is stored.
    async fn load(&self) -> Result<Profile, StoreError>;

    /// Overwrites the stored record with `profile`.
    async fn save(&self, profile: &Profile) -> Result<(), StoreError>;

    fn is_persistent(&self) -> bool {
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// NullProfileStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct NullProfileStore;

#[async_trait]
impl ProfileStore for NullProfileStore {
    async fn load(&self) -> Result<Profile, StoreError> {
        Ok(Profile::default())
    }

    async fn save(&self, _profile: &Profile) -> Result<(), StoreError> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FileProfileStore
// ────────────────────────────────────────────────────────────────────────────

/// Storage area kept as one JSON file. Keys other than `PROFILE_KEY` are preserved.
#[derive(Debug)]
pub struct FileProfileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles of the storage file.
    write_lock: Mutex<()>,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_area(&self) -> Result<Map<String, Value>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self) -> Result<Profile, StoreError> {
        let mut area = self.read_area().await?;
        match area.remove(PROFILE_KEY) {
            Some(record) => Ok(serde_json::from_value(record)?),
            None => {
                debug!(path = %self.path.display(), "no stored profile, using defaults");
                Ok(Profile::default())
            }
        }
    }

    async fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut area = match self.read_area().await {
            Ok(area) => area,
            Err(StoreError::Json(e)) => {
                warn!(path = %self.path.display(), "storage file is corrupt, rewriting it: {e}");
                Map::new()
            }
            Err(e) => return Err(e),
        };
        area.insert(PROFILE_KEY.to_string(), serde_json::to_value(profile)?);

        let bytes = serde_json::to_vec_pretty(&Value::Object(area))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }
}

/// Picks the file store when `path` is usable, the null store otherwise.
pub async fn select_store(path: Option<&Path>) -> Arc<dyn ProfileStore> {
    let Some(path) = path else {
        info!("No profile storage configured; profile changes stay in memory");
        return Arc::new(NullProfileStore);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!(
                path = %path.display(),
                "Profile storage unavailable, continuing without persistence: {e}"
            );
            return Arc::new(NullProfileStore);
        }
    }

    info!(path = %path.display(), "Profile storage ready");
    Arc::new(FileProfileStore::new(path))
}
