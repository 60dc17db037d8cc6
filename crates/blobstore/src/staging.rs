// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Local staging area for object transfers
//!
//! Every upload and download passes through a file in the staging directory.
//! The bytes are written, synced to disk and read back before the transfer
//! continues, so the caller only ever sees bytes that made it to durable
//! storage. File names start with the sanitized storage key and carry a
//! random suffix, so concurrent transfers never share a file.

use crate::{Result, StoreError};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Which way a staged transfer is going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl Direction {
    fn suffix(self) -> &'static str {
        match self {
            Direction::Upload => ".up",
            Direction::Download => ".down",
        }
    }
}

/// A staged copy of an object. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedObject {
    file: NamedTempFile,
    bytes: Bytes,
}

impl StagedObject {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The bytes as read back from the synced staging file
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Use `dir` for staging files, creating it if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Configuration(format!(
                "cannot create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` to a fresh staging file, sync it, and read it back
    pub async fn stage(&self, key: &str, direction: Direction, data: &[u8]) -> Result<StagedObject> {
        let prefix = staging_prefix(key);
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(direction.suffix())
            .tempfile_in(&self.dir)
            .map_err(|e| StoreError::staging(key, e))?;

        let path = file.path().to_path_buf();
        {
            let mut out = tokio::fs::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&path)
                .await
                .map_err(|e| StoreError::staging(key, e))?;
            out.write_all(data)
                .await
                .map_err(|e| StoreError::staging(key, e))?;
            out.sync_all()
                .await
                .map_err(|e| StoreError::staging(key, e))?;
        }

        let staged = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::staging(key, e))?;
        if staged.len() != data.len() {
            return Err(StoreError::staging(
                key,
                std::io::Error::other(format!(
                    "staged {} bytes but read back {}",
                    data.len(),
                    staged.len()
                )),
            ));
        }

        let size = staged.len();
        let staged_path = path.display().to_string();
        diagnostics::debug!(
            "staged {size} bytes for {key} at {staged_path}",
            size: size,
            key: key,
            staged_path: staged_path
        );

        Ok(StagedObject {
            file,
            bytes: Bytes::from(staged),
        })
    }
}

/// File name prefix for a storage key: path separators and anything outside
/// `[A-Za-z0-9._-]` become `_`.
#[must_use]
pub fn staging_prefix(key: &str) -> String {
    let mut prefix: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    prefix.push('.');
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_staging_prefix_is_derived_from_key() {
        assert_eq!(
            staging_prefix("Assets/ComputeInstanceinventory.parquet"),
            "Assets_ComputeInstanceinventory.parquet."
        );
        assert_eq!(staging_prefix("a b/c:d"), "a_b_c_d.");
    }

    #[tokio::test]
    async fn test_stage_round_trips_and_cleans_up() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("staging")).unwrap();

        let staged = staging
            .stage("Assets/Vpcinventory.parquet", Direction::Upload, b"columnar bytes")
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Assets_Vpcinventory.parquet."));
        assert!(name.ends_with(".up"));
        assert_eq!(staged.bytes().as_ref(), b"columnar bytes");

        let bytes = staged.into_bytes();
        assert_eq!(bytes.as_ref(), b"columnar bytes");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_stages_of_same_key_get_distinct_files() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();

        let (a, b) = tokio::join!(
            staging.stage("k", Direction::Download, b"first"),
            staging.stage("k", Direction::Download, b"second"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        assert_eq!(a.bytes().as_ref(), b"first");
        assert_eq!(b.bytes().as_ref(), b"second");
    }
}
