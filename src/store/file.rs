//! File-backed record storage.
//!
//! The collection lives in one pretty-printed JSON document,
//! `{"instances": [...]}`. Every save runs a two-phase sequence:
//!
//! 1. copy the current document to the backup path;
//! 2. replace the primary through a temp file + atomic rename.
//!
//! Phase 2 never runs unless phase 1 succeeded, so a failed backup can not
//! cost the previous state. The first-ever save has nothing to back up and
//! skips phase 1.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::config::StorageConfig;
use crate::fleet::MachineCollection;

use super::RecordStore;
use super::error::{StoreError, StoreResult};

/// File-based implementation of `RecordStore`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.path, config.backup_path())
    }

    /// Path of the primary instances document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the pre-write backup is copied to.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Copy the current document to the backup path.
    ///
    /// Returns `false` when there is no primary document yet. Any failure of
    /// the copy itself aborts the save before the primary is touched.
    async fn write_backup(&self) -> StoreResult<bool> {
        match fs::metadata(&self.path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io(&self.path, e)),
            Ok(_) => {}
        }

        fs::copy(&self.path, &self.backup_path)
            .await
            .map_err(|e| StoreError::backup_write(&self.backup_path, e))?;
        Ok(true)
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn load(&self) -> StoreResult<MachineCollection> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let fleet: MachineCollection =
            serde_json::from_str(&contents).map_err(|e| StoreError::corrupt(&self.path, e.to_string()))?;

        debug!(path = %self.path.display(), count = fleet.len(), "collection loaded");
        Ok(fleet)
    }

    async fn save(&self, fleet: &MachineCollection) -> StoreResult<()> {
        let json = to_document_json(fleet)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let backed_up = self.write_backup().await?;

        let temp_path = temp_sibling(&self.path);
        fs::write(&temp_path, json.as_bytes())
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            count = fleet.len(),
            backed_up,
            "collection saved"
        );
        Ok(())
    }
}

/// Serialize the instances document with 4-space indentation.
fn to_document_json(fleet: &MachineCollection) -> StoreResult<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    fleet
        .serialize(&mut ser)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut json = String::from_utf8(out).map_err(|e| StoreError::Serialization(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

// ============================================================================
// Tests
// ============================================================================
