use crate::errors::StoreResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read side of a photo archive.
pub trait ArchiveReader {
    fn entries(&self) -> StoreResult<Vec<ArchiveEntry>>;
    fn read(&self, name: &str) -> StoreResult<Vec<u8>>;
}

/// Write side of a photo archive. `finish` returns the number of entries
/// written.
pub trait ArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> StoreResult<()>;
    fn finish(&mut self) -> StoreResult<usize>;
}

impl<W: ArchiveWriter + ?Sized> ArchiveWriter for &mut W {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        (**self).add_entry(name, bytes)
    }

    fn finish(&mut self) -> StoreResult<usize> {
        (**self).finish()
    }
}
