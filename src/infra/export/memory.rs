use indexmap::IndexMap;

use crate::errors::{StoreError, StoreResult};
use crate::infra::archive::memory::MemoryArchive;
use crate::usecase::ports::archive::ArchiveWriter;
use crate::usecase::ports::tabular::{ArtifactSink, SheetOutput};

/// Keeps every written artifact in memory. `fail_on` makes writing the named
/// artifact fail, for exercising partial exports.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub workbooks: IndexMap<String, Vec<SheetOutput>>,
    pub texts: IndexMap<String, String>,
    pub archives: IndexMap<String, MemoryArchive>,
    pub fail_on: Option<String>,
}

impl MemorySink {
    fn check(&self, name: &str) -> StoreResult<()> {
        match &self.fail_on {
            Some(failing) if failing == name => {
                Err(StoreError::message(format!("refusing to write {name}")))
            }
            _ => Ok(()),
        }
    }

    pub fn sheet(&self, workbook: &str, sheet: &str) -> Option<&SheetOutput> {
        self.workbooks
            .get(workbook)?
            .iter()
            .find(|candidate| candidate.name == sheet)
    }
}

impl ArtifactSink for MemorySink {
    fn write_workbook(&mut self, name: &str, sheets: &[SheetOutput]) -> StoreResult<()> {
        self.check(name)?;
        self.workbooks.insert(name.to_string(), sheets.to_vec());
        Ok(())
    }

    fn write_text(&mut self, name: &str, text: &str) -> StoreResult<()> {
        self.check(name)?;
        self.texts.insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn archive_writer(&mut self, name: &str) -> StoreResult<Box<dyn ArchiveWriter + '_>> {
        self.check(name)?;
        let archive = self.archives.entry(name.to_string()).or_default();
        *archive = MemoryArchive::default();
        Ok(Box::new(archive))
    }
}
