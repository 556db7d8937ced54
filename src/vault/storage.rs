//! Target directory
//!
//! Lookup of target database records by logical name. The gateway only
//! reads from it; records are owned by whatever configuration store backs it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::engine::error::{GatewayError, GatewayResult};
use crate::vault::credentials::DbConfigRecord;

/// Read-only lookup of target database records
pub trait TargetDirectory: Send + Sync {
    fn lookup(&self, name: &str) -> GatewayResult<Option<DbConfigRecord>>;
}

/// In-memory directory, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: HashMap<String, DbConfigRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: DbConfigRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<DbConfigRecord> for MemoryDirectory {
    fn from_iter<I: IntoIterator<Item = DbConfigRecord>>(iter: I) -> Self {
        let mut directory = Self::new();
        for record in iter {
            directory.insert(record);
        }
        directory
    }
}

impl TargetDirectory for MemoryDirectory {
    fn lookup(&self, name: &str) -> GatewayResult<Option<DbConfigRecord>> {
        Ok(self.records.get(name).cloned())
    }
}

/// Directory backed by a JSON array of records on disk
///
/// The file is read once at open; later edits need a new instance.
pub struct JsonDirectory {
    inner: MemoryDirectory,
}

impl JsonDirectory {
    pub fn open(path: &Path) -> GatewayResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::config(format!("Failed to read targets file {:?}: {}", path, e))
        })?;

        let records: Vec<DbConfigRecord> = serde_json::from_str(&content).map_err(|e| {
            GatewayError::config(format!("Failed to parse targets file {:?}: {}", path, e))
        })?;

        let inner: MemoryDirectory = records.into_iter().collect();
        debug!("Loaded {} target database records from {:?}", inner.len(), path);

        Ok(Self { inner })
    }
}

impl TargetDirectory for JsonDirectory {
    fn lookup(&self, name: &str) -> GatewayResult<Option<DbConfigRecord>> {
        self.inner.lookup(name)
    }
}
