//! Persistence for the bookshelf collection.
//!
//! The whole collection is written through as a single versioned JSON
//! document on every mutation. Load and save fail soft: a malformed or
//! unreadable document degrades to an empty collection, a failed write is
//! logged and skipped, and neither surfaces an error to the caller.

use crate::types::SongRecord;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk schema version.
pub const SHELF_SCHEMA_VERSION: u32 = 1;

/// Persistent store abstraction for the record collection.
pub trait ShelfStore: Send + Sync {
    /// Load the full collection; empty on any read or decode failure.
    fn load(&self) -> Vec<SongRecord>;
    /// Persist the full collection; logs and returns on write failure.
    fn save(&self, records: &[SongRecord]);
}

/// Errors raised while preparing the backing file. Load/save recover from
/// their own failures internally and never return these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Versioned on-disk document wrapping the record array.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShelfDocument {
    schema_version: u32,
    records: Vec<SongRecord>,
}

/// Accepted blob shapes: the versioned document, or the legacy bare record
/// array written before the schema version existed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShelfBlob {
    Versioned(ShelfDocument),
    Legacy(Vec<SongRecord>),
}

/// JSON-document shelf store backed by a single file.
pub struct JsonShelfStore {
    path: PathBuf,
    /// Serialize write access to the document file.
    write_lock: Mutex<()>,
}

impl JsonShelfStore {
    /// Create a store writing to the given file, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("initialized shelf store (path={})", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Decode a raw blob into records, accepting the legacy bare-array form.
    fn decode(contents: &str) -> Result<Vec<SongRecord>, serde_json::Error> {
        match serde_json::from_str::<ShelfBlob>(contents)? {
            ShelfBlob::Versioned(document) => {
                if document.schema_version > SHELF_SCHEMA_VERSION {
                    warn!(
                        "unsupported shelf schema version {}, starting empty",
                        document.schema_version
                    );
                    return Ok(Vec::new());
                }
                Ok(document.records)
            }
            ShelfBlob::Legacy(records) => {
                info!("loaded legacy shelf blob ({} records)", records.len());
                Ok(records)
            }
        }
    }
}

impl ShelfStore for JsonShelfStore {
    fn load(&self) -> Vec<SongRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no shelf document yet (path={})", self.path.display());
                return Vec::new();
            }
            Err(err) => {
                warn!("failed to read shelf document, starting empty: {err}");
                return Vec::new();
            }
        };

        match Self::decode(&contents) {
            Ok(records) => {
                debug!("loaded shelf document ({} records)", records.len());
                records
            }
            Err(err) => {
                warn!("malformed shelf document, starting empty: {err}");
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[SongRecord]) {
        let _guard = self.write_lock.lock();
        let document = ShelfDocument {
            schema_version: SHELF_SCHEMA_VERSION,
            records: records.to_vec(),
        };
        let contents = match serde_json::to_string(&document) {
            Ok(contents) => contents,
            Err(err) => {
                warn!("failed to encode shelf document, skipping write: {err}");
                return;
            }
        };

        // Write to a sibling temp file first so a failed write cannot
        // truncate the existing document.
        let temp_path = self.path.with_extension("json.tmp");
        if let Err(err) = fs::write(&temp_path, contents) {
            warn!("failed to write shelf document, skipping: {err}");
            return;
        }
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            warn!("failed to replace shelf document, skipping: {err}");
        } else {
            debug!("saved shelf document ({} records)", records.len());
        }
    }
}

/// In-memory shelf store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryShelfStore {
    records: Mutex<Vec<SongRecord>>,
}

impl MemoryShelfStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored records, for assertions.
    pub fn snapshot(&self) -> Vec<SongRecord> {
        self.records.lock().clone()
    }
}

impl ShelfStore for MemoryShelfStore {
    fn load(&self) -> Vec<SongRecord> {
        self.records.lock().clone()
    }

    fn save(&self, records: &[SongRecord]) {
        *self.records.lock() = records.to_vec();
    }
}
