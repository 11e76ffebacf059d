use crate::domain::roster::{Roster, MEMBERS_SHEET, MEMBER_COLUMNS};
use crate::errors::{StoreError, StoreResult};
use crate::usecase::ports::tabular::{ArtifactSink, SheetOutput};

/// Writes one organisation's members as a single-sheet workbook named after
/// the organisation. Returns the workbook name.
pub fn export_members(
    roster: &Roster,
    org_id: &str,
    sink: &mut dyn ArtifactSink,
) -> StoreResult<String> {
    let department = roster
        .department(org_id)
        .ok_or_else(|| StoreError::message(format!("organisation not found: {org_id}")))?;
    if department.members.is_empty() {
        return Err(StoreError::message(format!(
            "organisation {org_id} has no members to export"
        )));
    }

    let sheet = SheetOutput {
        name: MEMBERS_SHEET.to_string(),
        columns: MEMBER_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: department.member_rows(),
    };
    let name = department.export_name();
    sink.write_workbook(&name, &[sheet])?;
    tracing::info!(org_id, workbook = %name, members = department.members.len(), "members exported");
    Ok(name)
}

/// Writes the `Last, First | Organisation` listing as a text artifact.
/// Returns the number of lines.
pub fn export_directory_listing(
    roster: &Roster,
    sink: &mut dyn ArtifactSink,
    name: &str,
) -> StoreResult<usize> {
    let listing = roster.directory_listing();
    let lines = listing.lines().count();
    sink.write_text(name, &listing)?;
    tracing::info!(artifact = name, lines, "directory listing written");
    Ok(lines)
}
