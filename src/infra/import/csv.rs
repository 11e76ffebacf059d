use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::errors::{StoreError, StoreResult};
use crate::usecase::ports::tabular::TabularStore;

/// A workbook stored as a directory of `<sheet>.csv` files. Sheets are
/// ordered by file name.
#[derive(Debug, Clone, Default)]
pub struct CsvStore {
    sheets: IndexMap<String, Vec<Vec<String>>>,
}

impl CsvStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut csv_paths: Vec<_> = walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        csv_paths.sort();

        let mut sheets = IndexMap::new();
        for csv_path in csv_paths {
            let sheet_name = csv_path
                .file_stem()
                .and_then(|name| name.to_str())
                .filter(|name| !name.is_empty())
                .unwrap_or("sheet")
                .to_string();
            let grid = read_csv_grid(&csv_path)?;
            sheets.insert(sheet_name, grid);
        }

        if sheets.is_empty() {
            anyhow::bail!("no csv sheets found in {}", dir.display())
        }
        tracing::info!(path = %dir.display(), sheets = sheets.len(), "opened csv workbook");
        Ok(Self { sheets })
    }
}

pub fn read_csv_grid(csv_path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

impl TabularStore for CsvStore {
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
