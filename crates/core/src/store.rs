//! File-backed JSON document store.
//!
//! Every document is a single pretty-printed JSON file. Writers never expose a partially written
//! file:
//!
//! - [`DocumentStore::write`] writes a temporary sibling and renames it over the target.
//! - [`DocumentStore::create_new`] writes a temporary sibling and hard-links it to the target,
//!   which fails if the target already exists. This gives exclusive creation with complete
//!   content, and is what keeps report ids unique.
//!
//! Temporary files start with `.` and are skipped by [`DocumentStore::list`].

use crate::constants::DOCUMENT_EXTENSION;
use crate::{RecordError, RecordResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct DocumentStore;

impl DocumentStore {
    pub fn new() -> Self {
        Self
    }

    /// Reads and deserializes the document at `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::FileRead` on I/O failure, or `RecordError::Deserialization` if the
    /// file is not a valid document.
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> RecordResult<Option<T>> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RecordError::FileRead(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| RecordError::Deserialization {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Writes `value` to `path`, replacing any existing document atomically.
    pub fn write<T: Serialize>(&self, path: &Path, value: &T) -> RecordResult<()> {
        let tmp = self.write_temp(path, value)?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            RecordError::FileWrite(e)
        })
    }

    /// Writes `value` to `path` only if no document exists there yet.
    ///
    /// Returns `Ok(false)` if the path was already taken.
    pub fn create_new<T: Serialize>(&self, path: &Path, value: &T) -> RecordResult<bool> {
        let tmp = self.write_temp(path, value)?;
        let linked = fs::hard_link(&tmp, path);
        let _ = fs::remove_file(&tmp);

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(RecordError::FileWrite(e)),
        }
    }

    /// Removes the document at `path`. Returns `Ok(false)` if it did not exist.
    pub fn remove(&self, path: &Path) -> RecordResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RecordError::FileRemove(e)),
        }
    }

    /// Lists the document files directly under `dir`, sorted by path.
    ///
    /// A missing directory is treated as empty.
    pub fn list(&self, dir: &Path) -> RecordResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RecordError::FileRead(e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(RecordError::FileRead)?;
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |n| n.starts_with('.'));
            let is_document = path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION);
            if !hidden && is_document && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn write_temp<T: Serialize>(&self, path: &Path, value: &T) -> RecordResult<PathBuf> {
        let parent = path.parent().ok_or_else(|| {
            RecordError::InvalidInput(format!("document path has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent).map_err(RecordError::StorageDirCreation)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let tmp = parent.join(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        let json = serde_json::to_vec_pretty(value).map_err(RecordError::Serialization)?;
        fs::write(&tmp, json).map_err(RecordError::FileWrite)?;
        Ok(tmp)
    }
}

/// Path of the document for `name` in `dir`.
pub fn document_path(dir: &Path, name: impl std::fmt::Display) -> PathBuf {
    dir.join(format!("{name}.{DOCUMENT_EXTENSION}"))
}
