use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{StoreError, StoreResult};
use crate::usecase::ports::archive::{ArchiveEntry, ArchiveReader, ArchiveWriter};

/// A photo folder on disk read as an archive. Entry names are relative to
/// the root and `/`-separated; directory entries end with `/`.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::message(format!(
                "photo folder not found: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }
}

fn relative_name(root: &Path, path: &Path) -> StoreResult<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        StoreError::message(format!("{} is outside {}", path.display(), root.display()))
    })?;
    let parts: Vec<String> = rel
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

impl ArchiveReader for DirArchive {
    fn entries(&self) -> StoreResult<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| StoreError::Io(err.into()))?;
            let is_dir = entry.file_type().is_dir();
            let mut name = relative_name(&self.root, entry.path())?;
            if is_dir {
                name.push('/');
            }
            entries.push(ArchiveEntry { name, is_dir });
        }
        Ok(entries)
    }

    fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        Ok(fs::read(self.root.join(name))?)
    }
}

/// Writes archive entries as files under `root`, creating directories as
/// needed.
#[derive(Debug)]
pub struct DirArchiveWriter {
    root: PathBuf,
    written: usize,
}

impl DirArchiveWriter {
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, written: 0 })
    }
}

impl ArchiveWriter for DirArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        let out = self.root.join(name);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out, bytes)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<usize> {
        tracing::debug!(root = %self.root.display(), entries = self.written, "closed photo folder");
        Ok(self.written)
    }
}
