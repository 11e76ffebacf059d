use std::fmt;

use indexmap::IndexMap;

use crate::domain::entities::record::{columns, field, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Restricted,
}

impl Visibility {
    /// Case-insensitive; anything that is not "restricted" is public.
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("restricted") {
            Visibility::Restricted
        } else {
            Visibility::Public
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Restricted => "Restricted",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationRecord {
    pub id: String,
    pub name: String,
    pub visibility: Visibility,
}

impl OrganisationRecord {
    /// `None` for rows without an `OrganisationID`.
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = field(row, columns::ORGANISATION_ID).trim();
        if id.is_empty() {
            return None;
        }
        let name = [columns::NAME_EN, columns::NAME]
            .iter()
            .map(|column| field(row, column))
            .find(|value| !value.is_empty())
            .unwrap_or("(No Name)");
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            visibility: Visibility::parse(field(row, columns::VISIBILITY)),
        })
    }

    pub fn is_restricted(&self) -> bool {
        self.visibility == Visibility::Restricted
    }
}

/// Organisations keyed by ID, in sheet order.
pub type OrganisationDirectory = IndexMap<String, OrganisationRecord>;

pub fn build_directory(rows: &[Row]) -> OrganisationDirectory {
    let mut directory = OrganisationDirectory::new();
    for record in rows.iter().filter_map(OrganisationRecord::from_row) {
        directory.entry(record.id.clone()).or_insert(record);
    }
    directory
}

/// A parent/child link from the originally loaded hierarchy sheet.
/// `original_index` is its position in that sheet and identifies it for
/// deletion staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEdge {
    pub original_index: usize,
    pub row: Row,
}

impl HierarchyEdge {
    pub fn parent(&self) -> &str {
        field(&self.row, columns::PARENT_ORGANISATION_ID)
    }

    pub fn child(&self) -> &str {
        field(&self.row, columns::CHILD_ORGANISATION_ID)
    }

    pub fn links(&self, parent: &str, child: &str) -> bool {
        self.parent() == parent && self.child() == child
    }
}

/// A staged hierarchy addition. Has no original index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEdge {
    pub parent: String,
    pub child: String,
}

impl NewEdge {
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(
            columns::PARENT_ORGANISATION_ID.to_string(),
            self.parent.clone(),
        );
        row.insert(columns::CHILD_ORGANISATION_ID.to_string(), self.child.clone());
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgEdit {
    pub name: String,
    pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;

    #[test]
    fn visibility_parse_is_case_insensitive() {
        assert_eq!(Visibility::parse("RESTRICTED"), Visibility::Restricted);
        assert_eq!(Visibility::parse("Public"), Visibility::Public);
        assert_eq!(Visibility::parse(""), Visibility::Public);
    }

    #[test]
    fn record_falls_back_through_name_columns() {
        let row = row_from([("OrganisationID", "org-1"), ("Name", "Chemistry")]);
        let record = OrganisationRecord::from_row(&row).expect("row has an id");
        assert_eq!(record.name, "Chemistry");

        let row = row_from([("OrganisationID", "org-2")]);
        let record = OrganisationRecord::from_row(&row).expect("row has an id");
        assert_eq!(record.name, "(No Name)");

        assert!(OrganisationRecord::from_row(&row_from([("Name_en", "x")])).is_none());
    }
}
