use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use indexmap::IndexMap;

use crate::errors::{StoreError, StoreResult};
use crate::usecase::ports::tabular::TabularStore;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// A spreadsheet read in full when opened. Every sheet is kept as a grid of
/// strings in workbook order.
#[derive(Debug, Clone, Default)]
pub struct XlsxStore {
    sheets: IndexMap<String, Vec<Vec<String>>>,
}

impl XlsxStore {
    pub fn open(xlsx_path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(xlsx_path)
            .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;

        let mut sheets = IndexMap::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .with_context(|| format!("failed to read sheet: {sheet_name}"))?;
            let grid: Vec<Vec<String>> = range
                .rows()
                .map(|r| r.iter().map(cell_to_string).collect())
                .collect();
            tracing::debug!(sheet = %sheet_name, rows = grid.len(), "read sheet");
            sheets.insert(sheet_name, grid);
        }

        tracing::info!(
            path = %xlsx_path.display(),
            sheets = sheets.len(),
            "opened workbook"
        );
        Ok(Self { sheets })
    }
}

impl TabularStore for XlsxStore {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_grid(&self, sheet: &str) -> StoreResult<Vec<Vec<String>>> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| StoreError::message(format!("sheet not found: {sheet}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_stringify_like_the_sheet_shows_them() {
        assert_eq!(cell_to_string(&Data::String("Lecturer".into())), "Lecturer");
        assert_eq!(cell_to_string(&Data::Float(45000.0)), "45000");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
