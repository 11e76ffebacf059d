use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::StoreResult;
use crate::infra::archive::dir::DirArchiveWriter;
use crate::usecase::ports::archive::ArchiveWriter;
use crate::usecase::ports::tabular::{ArtifactSink, SheetOutput};

/// Writes artifacts under one output directory. A workbook becomes a folder
/// holding one CSV per sheet; an archive becomes a folder of files.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub fn write_sheet_csv(path: &Path, sheet: &SheetOutput) -> StoreResult<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(&sheet.columns)?;
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl ArtifactSink for OutputDir {
    fn write_workbook(&mut self, name: &str, sheets: &[SheetOutput]) -> StoreResult<()> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)?;
        for sheet in sheets {
            write_sheet_csv(&dir.join(format!("{}.csv", sheet.name)), sheet)?;
        }
        tracing::info!(path = %dir.display(), sheets = sheets.len(), "wrote workbook");
        Ok(())
    }

    fn write_text(&mut self, name: &str, text: &str) -> StoreResult<()> {
        let path = self.root.join(name);
        fs::write(&path, text)?;
        tracing::info!(path = %path.display(), "wrote text file");
        Ok(())
    }

    fn archive_writer(&mut self, name: &str) -> StoreResult<Box<dyn ArchiveWriter + '_>> {
        let dir = self.root.join(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(Box::new(DirArchiveWriter::create(dir)?))
    }
}
