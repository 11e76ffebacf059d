use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::domain::entities::ledger::PersonLedger;
use crate::domain::entities::record::{columns, field, Row};

pub const CHANGE_LOG_TITLE: &str = "PURE PERSON MANAGER - CHANGE LOG";
const RULE: &str = "========================================";

/// Plain-text summary of the pending person changes, in ledger order.
pub fn format_change_log(ledger: &PersonLedger) -> String {
    let mut log = String::new();

    if !ledger.new_persons().is_empty() {
        let _ = writeln!(
            log,
            "--- NEW PERSONS CREATED ({}) ---",
            ledger.new_persons().len()
        );
        for entry in ledger.new_persons() {
            write_identity(&mut log, entry.id(), &entry.person);
            match &entry.photo {
                Some(photo) => {
                    let _ = writeln!(log, "   - Photo: {}", photo.filename);
                }
                None => log.push_str("   - Photo: (Default)\n"),
            }
            write_affiliations(&mut log, "Affiliations", &entry.staff);
        }
    }

    if !ledger.edits().is_empty() {
        let _ = writeln!(log, "--- EDITED PERSONS ({}) ---", ledger.edits().len());
        for (id, edit) in ledger.edits() {
            write_identity(&mut log, id, &edit.person);
            if let Some(photo) = ledger.photo_replacements().get(id) {
                let _ = writeln!(
                    log,
                    "   - Photo CHANGED: {} --> {}",
                    photo.original_filename.as_deref().unwrap_or("(None)"),
                    photo.new_filename
                );
            }
            write_affiliations(&mut log, "Final Affiliations", &edit.staff);
        }
    }

    if ledger.new_persons().is_empty() && ledger.edits().is_empty() {
        log.push_str("No changes detected.\n");
    }
    log
}

/// The change log file as saved next to an export: title, generation time
/// and the formatted body.
pub fn change_log_document(ledger: &PersonLedger, generated: NaiveDateTime) -> String {
    format!(
        "{CHANGE_LOG_TITLE}\nGenerated: {}\n{RULE}\n\n{}",
        generated.format("%d-%m-%Y %H:%M:%S"),
        format_change_log(ledger)
    )
}

fn write_identity(log: &mut String, id: &str, person: &Row) {
    let _ = writeln!(
        log,
        "ID: {id} | Name: {} {}",
        field(person, columns::FIRSTNAME),
        field(person, columns::LASTNAME)
    );
}

fn write_affiliations(log: &mut String, label: &str, staff: &[Row]) {
    let _ = writeln!(log, "   - {label} ({}):", staff.len());
    for row in staff {
        let _ = writeln!(
            log,
            "      -> [{}] : {}",
            field(row, columns::ORGANISATION_ID),
            field(row, columns::JOB_DESCRIPTION)
        );
    }
    log.push('\n');
}
