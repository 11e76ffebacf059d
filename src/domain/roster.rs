use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::domain::entities::organisation::Visibility;
use crate::domain::entities::record::{columns, field, person_id, Row};
use crate::domain::entities::snapshot::Snapshot;

pub const MEMBERS_SHEET: &str = "Members";

pub const MEMBER_COLUMNS: [&str; 8] = [
    "Person ID",
    "Name",
    "Job Description",
    "Contract Type",
    "FTE",
    "Email",
    "Organisation",
    "Organisation ID",
];

const CONTRACT_TYPE: &str = "ContractType";
const FTE: &str = "FTE";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PersonName {
    first: String,
    last: String,
    email: String,
}

impl PersonName {
    fn display(&self) -> String {
        format!("{} {}", self.first, self.last).trim().to_string()
    }
}

/// One staff affiliation joined with the person it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    pub person_id: String,
    pub first: String,
    pub last: String,
    pub name: String,
    pub email: String,
    pub job: String,
    pub contract: String,
    pub fte: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub visibility: Visibility,
    /// In staff sheet order.
    pub members: Vec<RosterMember>,
}

impl Department {
    pub fn is_restricted(&self) -> bool {
        self.visibility == Visibility::Restricted
    }

    /// Members ordered by last name, case-insensitively.
    pub fn sorted_members(&self) -> Vec<&RosterMember> {
        let mut members: Vec<&RosterMember> = self.members.iter().collect();
        members.sort_by(|a, b| compare_text(&a.last, &b.last));
        members
    }

    /// The members table in export column order, one row per affiliation.
    pub fn member_rows(&self) -> Vec<Vec<String>> {
        self.members
            .iter()
            .map(|member| {
                vec![
                    member.person_id.clone(),
                    member.name.clone(),
                    member.job.clone(),
                    member.contract.clone(),
                    member.fte.clone(),
                    member.email.clone(),
                    self.name.clone(),
                    self.id.clone(),
                ]
            })
            .collect()
    }

    /// `<name>_Members`, with anything outside `[A-Za-z0-9]` replaced and
    /// the name cut to 30 characters.
    pub fn export_name(&self) -> String {
        let safe: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .take(30)
            .collect();
        format!("{safe}_Members")
    }
}

/// Staff per organisation, joined from the loaded person, staff and
/// organisation sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    departments: IndexMap<String, Department>,
}

impl Roster {
    /// Staff rows naming an unknown person or organisation are skipped.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut people: IndexMap<String, PersonName> = IndexMap::new();
        for row in &snapshot.persons().rows {
            let id = person_id(row);
            if id.is_empty() {
                continue;
            }
            people.insert(
                id.to_string(),
                PersonName {
                    first: field(row, columns::FIRSTNAME).to_string(),
                    last: field(row, columns::LASTNAME).to_string(),
                    email: field(row, columns::EMAIL).to_string(),
                },
            );
        }

        let mut departments: IndexMap<String, Department> = IndexMap::new();
        for row in &snapshot.organisations().rows {
            let id = field(row, columns::ORGANISATION_ID).trim();
            if id.is_empty() {
                continue;
            }
            departments.insert(
                id.to_string(),
                Department {
                    id: id.to_string(),
                    name: department_name(row, id),
                    visibility: Visibility::parse(field(row, columns::VISIBILITY)),
                    members: Vec::new(),
                },
            );
        }

        let mut skipped = 0usize;
        for row in &snapshot.staff().rows {
            let id = person_id(row);
            let org_id = field(row, columns::ORGANISATION_ID);
            let joined = people.get(id).zip(departments.get_mut(org_id));
            let Some((person, department)) = joined else {
                skipped += 1;
                continue;
            };
            let job = field(row, columns::JOB_DESCRIPTION);
            department.members.push(RosterMember {
                person_id: id.to_string(),
                first: person.first.clone(),
                last: person.last.clone(),
                name: person.display(),
                email: person.email.clone(),
                job: if job.is_empty() { "Unknown" } else { job }.to_string(),
                contract: field(row, CONTRACT_TYPE).to_string(),
                fte: field(row, FTE).to_string(),
            });
        }
        if skipped > 0 {
            tracing::debug!(skipped, "staff rows without a known person or organisation");
        }

        Self { departments }
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.get(id)
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Departments sorted by name. Restricted ones are left out unless
    /// `include_restricted` is set. A non-empty `filter` keeps departments
    /// whose name or ID contains it, ignoring case.
    pub fn departments(&self, include_restricted: bool, filter: &str) -> Vec<&Department> {
        let filter = filter.trim().to_lowercase();
        let mut departments: Vec<&Department> = self
            .departments
            .values()
            .filter(|dept| include_restricted || !dept.is_restricted())
            .filter(|dept| {
                filter.is_empty()
                    || dept.name.to_lowercase().contains(&filter)
                    || dept.id.to_lowercase().contains(&filter)
            })
            .collect();
        departments.sort_by(|a, b| compare_text(&a.name, &b.name));
        departments
    }

    /// `Last, First | Organisation`, one line per affiliation, sorted.
    pub fn directory_listing(&self) -> String {
        let mut lines: Vec<String> = self
            .departments
            .values()
            .flat_map(|dept| {
                dept.members
                    .iter()
                    .map(move |member| format!("{}, {} | {}", member.last, member.first, dept.name))
            })
            .collect();
        lines.sort_by(|a, b| compare_text(a, b));
        lines.join("\n")
    }
}

fn department_name(row: &Row, id: &str) -> String {
    [columns::NAME_EN, columns::NAME]
        .iter()
        .map(|column| field(row, column))
        .find(|value| !value.is_empty())
        .unwrap_or(id)
        .to_string()
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;
    use crate::domain::entities::snapshot::SheetData;

    fn header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn snapshot() -> Snapshot {
        let persons = SheetData::new(
            "Persons",
            header(&["PersonID", "Firstname", "Lastname", "Email"]),
            vec![
                row_from([("PersonID", "jdoe"), ("Firstname", "Jane"), ("Lastname", "Doe"), ("Email", "jane@example.org")]),
                row_from([("PersonID", "bsmith"), ("Firstname", "Bob"), ("Lastname", "smith"), ("Email", "bob@example.org")]),
                row_from([("PersonID", "aadams"), ("Firstname", "Ann"), ("Lastname", "Adams"), ("Email", "ann@example.org")]),
            ],
        );
        let staff = SheetData::new(
            "Staff",
            header(&["PersonID", "OrganisationID", "JobDescription", "ContractType", "FTE"]),
            vec![
                row_from([("PersonID", "jdoe"), ("OrganisationID", "chem"), ("JobDescription", "Lecturer"), ("ContractType", "openended"), ("FTE", "1")]),
                row_from([("PersonID", "bsmith"), ("OrganisationID", "chem")]),
                row_from([("PersonID", "aadams"), ("OrganisationID", "chem"), ("JobDescription", "Reader")]),
                row_from([("PersonID", "jdoe"), ("OrganisationID", "vault"), ("JobDescription", "Keeper")]),
                row_from([("PersonID", "ghost"), ("OrganisationID", "chem")]),
                row_from([("PersonID", "bsmith"), ("OrganisationID", "nowhere")]),
            ],
        );
        let organisations = SheetData::new(
            "Organisations",
            header(&["OrganisationID", "Name_en", "Visibility"]),
            vec![
                row_from([("OrganisationID", "chem"), ("Name_en", "School of Chemistry"), ("Visibility", "Public")]),
                row_from([("OrganisationID", "vault"), ("Name_en", "Archive Vault"), ("Visibility", "restricted")]),
                row_from([("OrganisationID", "anon"), ("Visibility", "Public")]),
            ],
        );
        Snapshot::new(persons, staff, organisations, SheetData::default())
    }

    #[test]
    fn staff_rows_join_to_known_people_and_organisations() {
        let roster = Roster::build(&snapshot());

        let chem = roster.department("chem").expect("chem is loaded");
        assert_eq!(chem.members.len(), 3);
        assert_eq!(chem.members[1].job, "Unknown");
        assert_eq!(chem.members[0].name, "Jane Doe");
        assert_eq!(roster.department("anon").map(|d| d.name.as_str()), Some("anon"));
        assert!(roster.department("nowhere").is_none());
    }

    #[test]
    fn members_sort_by_last_name_ignoring_case() {
        let roster = Roster::build(&snapshot());
        let chem = roster.department("chem").expect("chem is loaded");
        let order: Vec<&str> = chem
            .sorted_members()
            .iter()
            .map(|member| member.person_id.as_str())
            .collect();
        assert_eq!(order, vec!["aadams", "jdoe", "bsmith"]);
    }

    #[test]
    fn departments_sorted_and_filtered() {
        let roster = Roster::build(&snapshot());

        let names: Vec<&str> = roster
            .departments(false, "")
            .iter()
            .map(|dept| dept.name.as_str())
            .collect();
        assert_eq!(names, vec!["anon", "School of Chemistry"]);

        assert_eq!(roster.departments(true, "").len(), 3);
        let found: Vec<&str> = roster
            .departments(true, "VAULT")
            .iter()
            .map(|dept| dept.id.as_str())
            .collect();
        assert_eq!(found, vec!["vault"]);
    }

    #[test]
    fn member_rows_follow_export_columns() {
        let roster = Roster::build(&snapshot());
        let chem = roster.department("chem").expect("chem is loaded");
        let rows = chem.member_rows();
        assert_eq!(
            rows[0],
            vec!["jdoe", "Jane Doe", "Lecturer", "openended", "1", "jane@example.org", "School of Chemistry", "chem"]
        );
        assert_eq!(chem.export_name(), "School_of_Chemistry_Members");
    }

    #[test]
    fn directory_listing_is_sorted_by_line() {
        let roster = Roster::build(&snapshot());
        assert_eq!(
            roster.directory_listing(),
            "Adams, Ann | School of Chemistry\n\
Doe, Jane | Archive Vault\n\
Doe, Jane | School of Chemistry\n\
smith, Bob | School of Chemistry"
        );
    }
}
