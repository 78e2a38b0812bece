use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Archive, ArchiveStore, missing};
use crate::config::Objectives;
use crate::error::Result;

/// In-memory archive store.
///
/// A thin wrapper around `Arc<RwLock<BTreeMap<String, Archive>>>`; clones
/// share the same archives.
#[derive(Clone, Default)]
pub struct MemoryStore {
    archives: Arc<RwLock<BTreeMap<String, Archive>>>,
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the archive stored under `name`.
    pub fn insert(&self, name: impl Into<String>, archive: Archive) {
        self.archives.write().insert(name.into(), archive);
    }

    /// Number of stored archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archives.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archives.read().is_empty()
    }
}

impl ArchiveStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.archives.read().keys().cloned().collect())
    }

    fn load(&self, name: &str, objectives: &Objectives) -> Result<Archive> {
        let archive = self
            .archives
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| missing(name))?;
        archive.check_dims(objectives)?;
        Ok(archive)
    }
}
