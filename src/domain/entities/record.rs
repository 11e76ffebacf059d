use indexmap::IndexMap;

/// One spreadsheet row keyed by column header, in column order. Columns the
/// application does not know about are carried through untouched.
pub type Row = IndexMap<String, String>;

pub mod columns {
    pub const PERSON_ID: &str = "PersonID";
    pub const EMAIL: &str = "Email";
    pub const FIRSTNAME: &str = "Firstname";
    pub const LASTNAME: &str = "Lastname";
    pub const PROFILE_PHOTO: &str = "ProfilePhoto";
    pub const ORGANISATION_ID: &str = "OrganisationID";
    pub const JOB_DESCRIPTION: &str = "JobDescription";
    pub const NAME_EN: &str = "Name_en";
    pub const NAME: &str = "Name";
    pub const VISIBILITY: &str = "Visibility";
    pub const PARENT_ORGANISATION_ID: &str = "ParentOrganisationID";
    pub const CHILD_ORGANISATION_ID: &str = "ChildOrganisationID";
}

/// Value of `column`, or "" when the cell is absent.
pub fn field<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

pub fn person_id(row: &Row) -> &str {
    field(row, columns::PERSON_ID)
}

/// A row with every header column present and every value empty. Written in
/// place of a superseded record so row positions below it do not move.
pub fn blank_row(header: &[String]) -> Row {
    header
        .iter()
        .map(|column| (column.clone(), String::new()))
        .collect()
}

pub fn is_blank(row: &Row) -> bool {
    row.values().all(|value| value.is_empty())
}

/// `base` with every field of `overlay` written over it. Column order follows
/// `base`; columns only present in `overlay` are appended.
pub fn overlay(base: &Row, overlay: &Row) -> Row {
    let mut merged = base.clone();
    for (column, value) in overlay {
        merged.insert(column.clone(), value.clone());
    }
    merged
}

/// Builds a row from `(column, value)` pairs. Mostly useful in tests.
pub fn row_from<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(column, value)| (column.into(), value.into()))
        .collect()
}

/// Output column order for a sheet: the header first, then any column that
/// appears in `rows` but not in the header, in first-seen order.
pub fn output_columns(header: &[String], rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = header.to_vec();
    for row in rows {
        for column in row.keys() {
            if !columns.iter().any(|existing| existing == column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_row_has_every_header_column_empty() {
        let header = vec!["PersonID".to_string(), "Firstname".to_string()];
        let blank = blank_row(&header);
        assert_eq!(blank.keys().collect::<Vec<_>>(), vec!["PersonID", "Firstname"]);
        assert!(is_blank(&blank));
    }

    #[test]
    fn overlay_keeps_unknown_columns_and_order() {
        let base = row_from([("PersonID", "jdoe"), ("ORCID", "0000"), ("Lastname", "Doe")]);
        let edit = row_from([("Lastname", "Smith"), ("Email", "j@x.org")]);
        let merged = overlay(&base, &edit);
        assert_eq!(
            merged.iter().collect::<Vec<_>>(),
            vec![
                (&"PersonID".to_string(), &"jdoe".to_string()),
                (&"ORCID".to_string(), &"0000".to_string()),
                (&"Lastname".to_string(), &"Smith".to_string()),
                (&"Email".to_string(), &"j@x.org".to_string()),
            ]
        );
    }

    #[test]
    fn output_columns_appends_extra_keys_after_header() {
        let header = vec!["A".to_string(), "B".to_string()];
        let rows = vec![row_from([("B", "1"), ("C", "2")])];
        assert_eq!(output_columns(&header, &rows), vec!["A", "B", "C"]);
    }
}
