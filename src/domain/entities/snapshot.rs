use crate::domain::entities::organisation::{build_directory, HierarchyEdge, OrganisationDirectory};
use crate::domain::entities::record::{person_id, Row};

/// One loaded sheet: the resolved sheet name (if the workbook had one), its
/// header row, an optional description row that sat above the data, and the
/// data rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetData {
    pub name: Option<String>,
    pub header: Vec<String>,
    pub description: Option<Row>,
    pub rows: Vec<Row>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: Some(name.into()),
            header,
            description: None,
            rows,
        }
    }

    /// Present in the workbook with a usable header.
    pub fn is_writable(&self) -> bool {
        self.name.is_some() && !self.header.is_empty()
    }
}

/// The originally loaded dataset. Built once per load and never mutated;
/// every accessor hands out shared references only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    persons: SheetData,
    staff: SheetData,
    organisations: SheetData,
    hierarchy: SheetData,
    edges: Vec<HierarchyEdge>,
    directory: OrganisationDirectory,
}

impl Snapshot {
    pub fn new(
        persons: SheetData,
        staff: SheetData,
        organisations: SheetData,
        hierarchy: SheetData,
    ) -> Self {
        let edges = hierarchy
            .rows
            .iter()
            .enumerate()
            .map(|(original_index, row)| HierarchyEdge {
                original_index,
                row: row.clone(),
            })
            .collect();
        let directory = build_directory(&organisations.rows);
        Self {
            persons,
            staff,
            organisations,
            hierarchy,
            edges,
            directory,
        }
    }

    /// Person and staff sheets only, as the people editor loads them.
    pub fn people(persons: SheetData, staff: SheetData) -> Self {
        Self::new(persons, staff, SheetData::default(), SheetData::default())
    }

    pub fn persons(&self) -> &SheetData {
        &self.persons
    }

    pub fn staff(&self) -> &SheetData {
        &self.staff
    }

    pub fn organisations(&self) -> &SheetData {
        &self.organisations
    }

    pub fn hierarchy(&self) -> &SheetData {
        &self.hierarchy
    }

    pub fn edges(&self) -> &[HierarchyEdge] {
        &self.edges
    }

    pub fn directory(&self) -> &OrganisationDirectory {
        &self.directory
    }

    pub fn find_person(&self, id: &str) -> Option<&Row> {
        self.persons.rows.iter().find(|row| person_id(row) == id)
    }

    pub fn staff_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.staff.rows.iter().filter(move |row| person_id(row) == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;

    #[test]
    fn edges_are_numbered_in_sheet_order() {
        let hierarchy = SheetData::new(
            "OrganisationalHierarchy",
            vec![
                "ParentOrganisationID".to_string(),
                "ChildOrganisationID".to_string(),
            ],
            vec![
                row_from([("ParentOrganisationID", "a"), ("ChildOrganisationID", "b")]),
                row_from([("ParentOrganisationID", "a"), ("ChildOrganisationID", "c")]),
            ],
        );
        let snapshot = Snapshot::new(
            SheetData::default(),
            SheetData::default(),
            SheetData::default(),
            hierarchy,
        );
        let indices: Vec<usize> = snapshot.edges().iter().map(|e| e.original_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(snapshot.edges()[1].child(), "c");
    }
}
