use crate::domain::entities::record::{output_columns, Row};
use crate::errors::StoreResult;
use crate::usecase::ports::archive::ArchiveWriter;

/// Read access to a loaded workbook.
pub trait TabularStore {
    fn sheet_names(&self) -> Vec<String>;

    /// Raw cell text, row by row, header row included.
    fn read_grid(&self, sheet: &str) -> StoreResult<Vec<Vec<String>>>;

    fn read_header(&self, sheet: &str) -> StoreResult<Vec<String>> {
        Ok(self.read_grid(sheet)?.into_iter().next().unwrap_or_default())
    }

    /// Data rows keyed by header. Empty cells are left out of each row and
    /// rows with no values at all are skipped.
    fn read_rows(&self, sheet: &str) -> StoreResult<Vec<Row>> {
        let grid = self.read_grid(sheet)?;
        Ok(rows_from_grid(&grid))
    }
}

pub fn rows_from_grid(grid: &[Vec<String>]) -> Vec<Row> {
    let Some((header, body)) = grid.split_first() else {
        return Vec::new();
    };
    body.iter()
        .filter_map(|cells| {
            let row: Row = header
                .iter()
                .zip(cells)
                .filter(|(column, value)| !column.is_empty() && !value.is_empty())
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect();
            (!row.is_empty()).then_some(row)
        })
        .collect()
}

/// One sheet ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetOutput {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetOutput {
    /// Lays `rows` out under `header` (plus any extra columns the rows
    /// carry). Missing cells are written empty, so blank rows stay in place.
    pub fn from_rows(name: &str, header: &[String], rows: &[Row]) -> Self {
        let columns = output_columns(header, rows);
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// A sheet passed through exactly as it was read.
    pub fn from_grid(name: &str, grid: Vec<Vec<String>>) -> Self {
        let mut rows = grid.into_iter();
        let columns = rows.next().unwrap_or_default();
        Self {
            name: name.to_string(),
            columns,
            rows: rows.collect(),
        }
    }
}

/// Destination for export artifacts.
pub trait ArtifactSink {
    fn write_workbook(&mut self, name: &str, sheets: &[SheetOutput]) -> StoreResult<()>;

    fn write_text(&mut self, name: &str, text: &str) -> StoreResult<()>;

    fn archive_writer(&mut self, name: &str) -> StoreResult<Box<dyn ArchiveWriter + '_>>;
}

/// Sheet roles, each found by a case-insensitive keyword in the sheet name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Person,
    Staff,
    Organisations,
    Hierarchy,
    Classification,
}

impl SheetKind {
    pub fn matches(self, sheet_name: &str) -> bool {
        let name = sheet_name.to_lowercase();
        match self {
            SheetKind::Person => name.contains("person"),
            SheetKind::Staff => name.contains("staff"),
            SheetKind::Organisations => name.contains("organis") && !name.contains("hierarch"),
            SheetKind::Hierarchy => name.contains("hierarch"),
            SheetKind::Classification => name.contains("classif") || name.contains("dictionar"),
        }
    }

    pub fn find(self, sheet_names: &[String]) -> Option<&str> {
        sheet_names
            .iter()
            .find(|name| self.matches(name))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn rows_skip_empty_cells_and_blank_rows() {
        let rows = rows_from_grid(&grid(&[
            &["PersonID", "Firstname", "Lastname"],
            &["jdoe", "", "Doe"],
            &["", "", ""],
            &["asmith", "Alice"],
        ]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row_from([("PersonID", "jdoe"), ("Lastname", "Doe")]));
        assert_eq!(rows[1], row_from([("PersonID", "asmith"), ("Firstname", "Alice")]));
    }

    #[test]
    fn sheet_output_fills_missing_cells() {
        let header = vec!["A".to_string(), "B".to_string()];
        let sheet = SheetOutput::from_rows("S", &header, &[row_from([("B", "2")])]);
        assert_eq!(sheet.rows, vec![vec![String::new(), "2".to_string()]]);
    }

    #[test]
    fn sheet_keywords() {
        let names: Vec<String> = ["Persons", "Staff", "OrganisationalHierarchy", "Organisations"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(SheetKind::Organisations.find(&names), Some("Organisations"));
        assert_eq!(SheetKind::Hierarchy.find(&names), Some("OrganisationalHierarchy"));
        assert_eq!(SheetKind::Person.find(&names), Some("Persons"));
        assert!(SheetKind::Classification.find(&names).is_none());
    }
}
