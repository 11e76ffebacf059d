//! Builds person and staff rows from editor input, the way the person
//! editor fills them in before staging.

use chrono::{Days, NaiveDate};

use crate::domain::entities::ledger::{EditEntry, NewPersonEntry, StagingLedger};
use crate::domain::entities::organisation::OrganisationDirectory;
use crate::domain::entities::photo::{photo_filename, PhotoPayload, PhotoReplacement};
use crate::domain::entities::record::{columns, Row};
use crate::domain::entities::snapshot::Snapshot;

const MEDIA_CONTACT_ORG: &str = "experts";
const MEDIA_CONTACT_PREFIX: &str = "Media Contact - ";

/// Constant column values written on every staged staff row.
const STAFF_DEFAULTS: &[(&str, &str)] = &[
    ("ContractType", "openended"),
    ("JobTitle", ""),
    ("JobDescription_translated", ""),
    ("FTE", ""),
    ("WebsiteURL_en", ""),
    ("WebsiteURL_translated", ""),
    ("Primary", "no"),
    ("StaffType", "academic"),
    ("EndDate", ""),
    ("DirectPhoneNr", ""),
    ("MobilePhoneNr", ""),
    ("FaxNr", ""),
];

/// `first-last`, lowercased, whitespace collapsed to `-`, and everything
/// outside `[a-z0-9-]` dropped.
pub fn generate_person_id(first: &str, last: &str) -> String {
    let (first, last) = (first.trim().to_lowercase(), last.trim().to_lowercase());
    if first.is_empty() && last.is_empty() {
        return String::new();
    }
    let raw = format!("{first}-{last}");
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

pub fn person_id_in_use(snapshot: &Snapshot, ledger: &StagingLedger, id: &str) -> bool {
    snapshot.find_person(id).is_some()
        || ledger.persons.new_persons().iter().any(|entry| entry.id() == id)
}

pub fn format_day(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Normalises a typed start date to `dd-mm-yyyy`. Empty input means today.
/// `d-m-yyyy` and `d/m/yyyy` are zero-padded, and read as month-first when
/// the second part cannot be a month.
pub fn normalize_start_date(input: &str, today: NaiveDate) -> String {
    let clean = input.trim();
    if clean.is_empty() {
        return format_day(today);
    }
    let parts: Vec<&str> = clean.split(|c: char| c == '-' || c == '/').collect();
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let [p1, p2, year] = parts.as_slice() else {
        return clean.to_string();
    };
    let well_formed =
        p1.len() <= 2 && p2.len() <= 2 && year.len() == 4 && [*p1, *p2, *year].into_iter().all(numeric);
    if !well_formed {
        return clean.to_string();
    }
    let (mut day, mut month): (u32, u32) = match (p1.parse::<u32>(), p2.parse::<u32>()) {
        (Ok(day), Ok(month)) => (day, month),
        _ => return clean.to_string(),
    };
    if month > 12 && day <= 12 {
        std::mem::swap(&mut day, &mut month);
    }
    format!("{day:02}-{month:02}-{year}")
}

/// Renders a date cell for the editor: Excel serial numbers become
/// `dd-mm-yyyy`, anything else is returned as-is.
pub fn format_sheet_date(value: &str) -> String {
    let Ok(serial) = value.trim().parse::<f64>() else {
        return value.to_string();
    };
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return value.to_string();
    };
    if serial < 0.0 {
        return value.to_string();
    }
    match epoch.checked_add_days(Days::new(serial.floor() as u64)) {
        Some(date) => format_day(date),
        None => value.to_string(),
    }
}

/// Resolves what the user typed in an organisation field: `Name [id]`
/// yields the bracketed id, an exact name yields that organisation's id,
/// anything else is taken as an id.
pub fn resolve_org_reference(text: &str, directory: &OrganisationDirectory) -> String {
    let trimmed = text.trim();
    if let Some(open) = trimmed.rfind('[') {
        if let Some(id) = trimmed[open + 1..].strip_suffix(']') {
            return id.to_string();
        }
    }
    directory
        .values()
        .find(|org| org.name == trimmed)
        .map(|org| org.id.clone())
        .unwrap_or_else(|| text.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffiliationInput {
    pub organisation: String,
    pub job_description: String,
    pub employed_as: String,
    pub start_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonInput {
    pub person_id: String,
    pub first: String,
    pub last: String,
    pub email: String,
    pub known_first: String,
    pub known_last: String,
    pub post_nominals: String,
    pub visibility: String,
}

/// An uploaded photo file as the user supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Staff rows for the affiliation inputs. Rows whose organisation resolves
/// to nothing are dropped.
pub fn staff_rows(
    person: &PersonInput,
    affiliations: &[AffiliationInput],
    directory: &OrganisationDirectory,
    today: NaiveDate,
) -> Vec<Row> {
    affiliations
        .iter()
        .filter_map(|input| {
            let org_id = resolve_org_reference(&input.organisation, directory);
            if org_id.trim().is_empty() {
                return None;
            }
            let mut job = input.job_description.clone();
            if org_id.eq_ignore_ascii_case(MEDIA_CONTACT_ORG) && !job.starts_with(MEDIA_CONTACT_PREFIX) {
                job = format!("{MEDIA_CONTACT_PREFIX}{job}");
            }

            let mut row = Row::new();
            row.insert(columns::PERSON_ID.to_string(), person.person_id.clone());
            row.insert(columns::ORGANISATION_ID.to_string(), org_id);
            for (column, value) in STAFF_DEFAULTS {
                row.insert(column.to_string(), value.to_string());
            }
            row.insert(columns::JOB_DESCRIPTION.to_string(), job);
            row.insert("EmployedAs".to_string(), input.employed_as.clone());
            row.insert(
                "StartDate".to_string(),
                normalize_start_date(&input.start_date, today),
            );
            row.insert(columns::EMAIL.to_string(), person.email.clone());
            Some(row)
        })
        .collect()
}

/// A complete person row for a newly created person.
pub fn new_person_row(person: &PersonInput, photo_name: &str) -> Row {
    let pairs: [(&str, &str); 24] = [
        (columns::PERSON_ID, &person.person_id),
        ("Profiled", "yes"),
        ("Username", &person.email),
        (columns::EMAIL, &person.email),
        ("Title", ""),
        ("Title_translated", ""),
        ("PostNominals", &person.post_nominals),
        ("FirstNameKnownAs", &person.known_first),
        ("LastNameKnownAs", &person.known_last),
        ("FirstNameSorting", ""),
        ("LastNameSorting", ""),
        ("FormerLastName", ""),
        ("PriorAffiliations", ""),
        ("Gender", "UNKNOWN"),
        (columns::VISIBILITY, &person.visibility),
        (columns::PROFILE_PHOTO, photo_name),
        ("ClientID_1", ""),
        ("ClientID_2", ""),
        ("ClientID_3", ""),
        ("ExternallyAuthenticated", "no"),
        (columns::FIRSTNAME, &person.first),
        (columns::LASTNAME, &person.last),
        ("Nationality", ""),
        ("ORCID", ""),
    ];
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .collect()
}

/// The partial row for an edit: only the fields the editor controls.
pub fn edited_person_row(person: &PersonInput, photo_name: Option<&str>) -> Row {
    let mut row: Row = [
        (columns::PERSON_ID, &person.person_id),
        (columns::FIRSTNAME, &person.first),
        (columns::LASTNAME, &person.last),
        (columns::EMAIL, &person.email),
        ("FirstNameKnownAs", &person.known_first),
        ("LastNameKnownAs", &person.known_last),
        ("PostNominals", &person.post_nominals),
        (columns::VISIBILITY, &person.visibility),
    ]
    .into_iter()
    .map(|(column, value)| (column.to_string(), value.clone()))
    .collect();
    if let Some(photo_name) = photo_name {
        row.insert(columns::PROFILE_PHOTO.to_string(), photo_name.to_string());
    }
    row
}

/// Assembles a new-person ledger entry. Without an upload the person gets
/// `default_photo` and no archive file.
pub fn new_person_entry(
    person: &PersonInput,
    staff: Vec<Row>,
    upload: Option<PhotoUpload>,
    default_photo: &str,
) -> NewPersonEntry {
    let photo = upload.map(|upload| PhotoPayload {
        filename: photo_filename(&person.first, &person.last, &upload.name),
        bytes: upload.bytes,
    });
    let photo_name = photo
        .as_ref()
        .map(|p| p.filename.as_str())
        .unwrap_or(default_photo);
    NewPersonEntry {
        person: new_person_row(person, photo_name),
        staff,
        photo,
    }
}

/// Assembles an edit entry and, when a new photo was uploaded, the
/// replacement that supersedes `original_photo`.
pub fn edit_entry(
    person: &PersonInput,
    staff: Vec<Row>,
    upload: Option<PhotoUpload>,
    original_photo: Option<&str>,
) -> (EditEntry, Option<PhotoReplacement>) {
    let replacement = upload.map(|upload| PhotoReplacement {
        new_filename: photo_filename(&person.first, &person.last, &upload.name),
        new_file: upload.bytes,
        original_filename: original_photo.map(str::to_string),
    });
    let photo_name = replacement
        .as_ref()
        .map(|r| r.new_filename.as_str())
        .or(original_photo);
    let entry = EditEntry {
        person: edited_person_row(person, photo_name),
        staff,
    };
    (entry, replacement)
}
