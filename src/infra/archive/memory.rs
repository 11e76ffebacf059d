use indexmap::IndexMap;

use crate::errors::{StoreError, StoreResult};
use crate::usecase::ports::archive::{ArchiveEntry, ArchiveReader, ArchiveWriter};

/// An archive held in memory. `None` marks a directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryArchive {
    entries: IndexMap<String, Option<Vec<u8>>>,
    finished: bool,
}

impl MemoryArchive {
    pub fn add_dir(&mut self, name: &str) {
        self.entries.insert(name.to_string(), None);
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.entries.insert(name.to_string(), Some(bytes));
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).and_then(|bytes| bytes.as_deref())
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, bytes)| bytes.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ArchiveReader for MemoryArchive {
    fn entries(&self) -> StoreResult<Vec<ArchiveEntry>> {
        Ok(self
            .entries
            .iter()
            .map(|(name, bytes)| ArchiveEntry {
                name: name.clone(),
                is_dir: bytes.is_none(),
            })
            .collect())
    }

    fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        self.get(name)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| StoreError::message(format!("archive entry not found: {name}")))
    }
}

impl ArchiveWriter for MemoryArchive {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        self.insert(name, bytes.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<usize> {
        self.finished = true;
        Ok(self.file_names().len())
    }
}
