//! Computes the rows to export from the loaded snapshot and the pending
//! ledger. Nothing here mutates either input.
//!
//! Person/staff edits are written as "blank in place, append at the end":
//! the original row keeps its position but loses its values, and the merged
//! record goes to the bottom of the sheet. Row-position-sensitive diff tools
//! then see one blanked row and one appended row instead of every following
//! row shifting.

use crate::domain::entities::ledger::{OrgLedger, PersonLedger};
use crate::domain::entities::record::{blank_row, columns, overlay, person_id, Row};
use crate::domain::entities::snapshot::Snapshot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedPeople {
    pub persons: Vec<Row>,
    pub staff: Vec<Row>,
    /// Number of original person rows that were blanked by an edit.
    pub blanked_persons: usize,
    /// Number of original staff rows that were blanked by an edit.
    pub blanked_staff: usize,
}

pub fn merge_people(snapshot: &Snapshot, ledger: &PersonLedger) -> MergedPeople {
    let mut persons: Vec<Row> = snapshot.persons().rows.clone();
    let mut staff: Vec<Row> = snapshot.staff().rows.clone();
    let mut appended_persons = Vec::new();
    let mut appended_staff = Vec::new();
    let mut blanked_persons = 0;
    let mut blanked_staff = 0;

    for entry in ledger.new_persons() {
        appended_persons.push(entry.person.clone());
        appended_staff.extend(entry.staff.iter().cloned());
    }

    let person_blank = blank_row(&snapshot.persons().header);
    let staff_blank = blank_row(&snapshot.staff().header);

    for (id, edit) in ledger.edits() {
        match persons.iter().position(|row| person_id(row) == id) {
            Some(idx) => {
                let merged = overlay(&persons[idx], &edit.person);
                persons[idx] = person_blank.clone();
                appended_persons.push(merged);
                blanked_persons += 1;
            }
            None => {
                tracing::warn!(person_id = %id, "edited person not in snapshot; appending as-is");
                appended_persons.push(edit.person.clone());
            }
        }

        for row in staff.iter_mut().filter(|row| person_id(row) == id) {
            *row = staff_blank.clone();
            blanked_staff += 1;
        }
        appended_staff.extend(edit.staff.iter().cloned());
    }

    persons.extend(appended_persons);
    staff.extend(appended_staff);

    tracing::debug!(
        persons = persons.len(),
        staff = staff.len(),
        blanked_persons,
        blanked_staff,
        "merged person and staff sheets"
    );

    MergedPeople {
        persons,
        staff,
        blanked_persons,
        blanked_staff,
    }
}

/// Organisation rows with staged name/visibility edits applied in place.
/// Row order and count are unchanged.
pub fn merge_organisations(snapshot: &Snapshot, ledger: &OrgLedger) -> Vec<Row> {
    snapshot
        .organisations()
        .rows
        .iter()
        .map(|row| {
            let id = row
                .get(columns::ORGANISATION_ID)
                .map(String::as_str)
                .unwrap_or("");
            let mut out = row.clone();
            if let Some(edit) = ledger.org_edits().get(id) {
                out.insert(columns::NAME_EN.to_string(), edit.name.clone());
                out.insert(
                    columns::VISIBILITY.to_string(),
                    edit.visibility.as_str().to_string(),
                );
            }
            out
        })
        .collect()
}

/// Surviving original edges, followed by staged additions in staged order.
pub fn merge_hierarchy(snapshot: &Snapshot, ledger: &OrgLedger) -> Vec<Row> {
    snapshot
        .edges()
        .iter()
        .filter(|edge| !ledger.is_edge_deleted(edge.original_index))
        .map(|edge| edge.row.clone())
        .chain(ledger.new_edges().iter().map(|edge| edge.to_row()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ledger::{EditEntry, NewPersonEntry};
    use crate::domain::entities::organisation::Visibility;
    use crate::domain::entities::record::{is_blank, row_from};
    use crate::domain::entities::snapshot::SheetData;

    fn header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn people_snapshot() -> Snapshot {
        let persons = SheetData::new(
            "Persons",
            header(&["PersonID", "Firstname", "Lastname", "Email", "ORCID"]),
            vec![
                row_from([
                    ("PersonID", "jdoe"),
                    ("Firstname", "Jane"),
                    ("Lastname", "Doe"),
                    ("Email", "jane@example.org"),
                    ("ORCID", "0000-0001"),
                ]),
                row_from([
                    ("PersonID", "bsmith"),
                    ("Firstname", "Bob"),
                    ("Lastname", "Smith"),
                    ("Email", "bob@example.org"),
                ]),
            ],
        );
        let staff = SheetData::new(
            "Staff",
            header(&["PersonID", "OrganisationID", "JobDescription"]),
            vec![
                row_from([("PersonID", "jdoe"), ("OrganisationID", "org-1"), ("JobDescription", "Lecturer")]),
                row_from([("PersonID", "bsmith"), ("OrganisationID", "org-1"), ("JobDescription", "Professor")]),
                row_from([("PersonID", "jdoe"), ("OrganisationID", "org-2"), ("JobDescription", "Advisor")]),
            ],
        );
        Snapshot::people(persons, staff)
    }

    fn edit(id: &str, lastname: &str, staff: Vec<Row>) -> EditEntry {
        EditEntry {
            person: row_from([
                ("PersonID", id),
                ("Lastname", lastname),
                ("Email", "jane@example.org"),
            ]),
            staff,
        }
    }

    #[test]
    fn edit_blanks_original_rows_and_appends_merged_record() {
        let snapshot = people_snapshot();
        let mut ledger = PersonLedger::default();
        ledger
            .stage_edited_person(
                None,
                edit("jdoe", "Smith", vec![row_from([("OrganisationID", "org-3")])]),
                None,
            )
            .expect("should stage edit");

        let merged = merge_people(&snapshot, &ledger);

        assert_eq!(merged.persons.len(), 3);
        assert!(is_blank(&merged.persons[0]));
        assert_eq!(merged.persons[0].len(), 5, "blank row carries every header column");
        assert_eq!(merged.persons[1]["PersonID"], "bsmith");
        let moved = &merged.persons[2];
        assert_eq!(moved["Lastname"], "Smith");
        assert_eq!(moved["Firstname"], "Jane");
        assert_eq!(moved["ORCID"], "0000-0001", "unknown columns survive the edit");

        assert_eq!(merged.staff.len(), 4);
        assert!(is_blank(&merged.staff[0]));
        assert_eq!(merged.staff[1]["PersonID"], "bsmith");
        assert!(is_blank(&merged.staff[2]));
        assert_eq!(merged.staff[3]["OrganisationID"], "org-3");
        assert_eq!(merged.blanked_staff, 2);
    }

    #[test]
    fn new_persons_precede_edits_in_append_order() {
        let snapshot = people_snapshot();
        let mut ledger = PersonLedger::default();
        ledger
            .stage_edited_person(None, edit("bsmith", "Smyth", Vec::new()), None)
            .expect("should stage edit");
        ledger
            .stage_new_person(
                &snapshot,
                NewPersonEntry {
                    person: row_from([("PersonID", "asmith"), ("Email", "a@example.org")]),
                    staff: vec![row_from([("OrganisationID", "org-1")])],
                    photo: None,
                },
                None,
            )
            .expect("should stage new person");

        let merged = merge_people(&snapshot, &ledger);
        let tail: Vec<&str> = merged.persons[2..].iter().map(|r| person_id(r)).collect();
        assert_eq!(tail, vec!["asmith", "bsmith"]);
        assert_eq!(
            merged.persons.len(),
            snapshot.persons().rows.len() + ledger.new_persons().len() + merged.blanked_persons
        );
    }

    #[test]
    fn stale_edit_is_appended_without_blanking() {
        let snapshot = people_snapshot();
        let mut ledger = PersonLedger::default();
        ledger
            .stage_edited_person(None, edit("ghost", "Nobody", Vec::new()), None)
            .expect("should stage edit");

        let merged = merge_people(&snapshot, &ledger);
        assert_eq!(merged.blanked_persons, 0);
        assert_eq!(merged.persons.len(), 3);
        assert!(merged.persons[..2].iter().all(|row| !is_blank(row)));
        assert_eq!(person_id(&merged.persons[2]), "ghost");
    }

    #[test]
    fn merge_is_repeatable_and_leaves_snapshot_alone() {
        let snapshot = people_snapshot();
        let saved = snapshot.clone();
        let mut ledger = PersonLedger::default();
        ledger
            .stage_edited_person(None, edit("jdoe", "Smith", Vec::new()), None)
            .expect("should stage edit");

        let first = merge_people(&snapshot, &ledger);
        let second = merge_people(&snapshot, &ledger);

        assert_eq!(first, second);
        assert_eq!(snapshot, saved);
    }

    fn org_snapshot() -> Snapshot {
        let organisations = SheetData::new(
            "Organisations",
            header(&["OrganisationID", "Name_en", "Visibility", "Type"]),
            vec![
                row_from([("OrganisationID", "a"), ("Name_en", "Alpha"), ("Visibility", "Public"), ("Type", "faculty")]),
                row_from([("OrganisationID", "b"), ("Name_en", "Beta"), ("Visibility", "Public"), ("Type", "school")]),
            ],
        );
        let hierarchy = SheetData::new(
            "OrganisationalHierarchy",
            header(&["ParentOrganisationID", "ChildOrganisationID"]),
            vec![
                row_from([("ParentOrganisationID", "a"), ("ChildOrganisationID", "b")]),
                row_from([("ParentOrganisationID", "b"), ("ChildOrganisationID", "a")]),
            ],
        );
        Snapshot::new(SheetData::default(), SheetData::default(), organisations, hierarchy)
    }

    #[test]
    fn org_edit_overlays_in_place() {
        let snapshot = org_snapshot();
        let mut ledger = OrgLedger::default();
        ledger
            .stage_org_edit("b", "Beta School", Visibility::Restricted)
            .expect("should stage org edit");

        let rows = merge_organisations(&snapshot, &ledger);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], snapshot.organisations().rows[0]);
        assert_eq!(rows[1]["Name_en"], "Beta School");
        assert_eq!(rows[1]["Visibility"], "Restricted");
        assert_eq!(rows[1]["Type"], "school");
    }

    #[test]
    fn hierarchy_delete_toggle_round_trips() {
        let snapshot = org_snapshot();
        let mut ledger = OrgLedger::default();
        let untouched = merge_hierarchy(&snapshot, &ledger);

        ledger
            .toggle_hierarchy_delete(&snapshot, 1)
            .expect("edge 1 exists");
        let deleted = merge_hierarchy(&snapshot, &ledger);
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0]["ChildOrganisationID"], "b");

        ledger
            .toggle_hierarchy_delete(&snapshot, 1)
            .expect("edge 1 exists");
        assert_eq!(merge_hierarchy(&snapshot, &ledger), untouched);
    }
}
