use chrono::{Local, NaiveDateTime};

use crate::domain::changelog::change_log_document;
use crate::domain::entities::ledger::{OrgLedger, PersonLedger};
use crate::domain::entities::record::Row;
use crate::domain::entities::snapshot::{SheetData, Snapshot};
use crate::domain::merge::{merge_hierarchy, merge_organisations, merge_people};
use crate::domain::photos::reconcile_photos;
use crate::errors::{ExportError, StoreError, StoreResult};
use crate::usecase::ports::archive::ArchiveReader;
use crate::usecase::ports::tabular::{ArtifactSink, SheetOutput, TabularStore};
use crate::usecase::services::staging_service::StagingSession;

/// Artifact names used by the exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNames {
    pub workbook: String,
    pub photo_archive: String,
    pub change_log: String,
    pub org_workbook: String,
    pub directory_listing: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            workbook: "Pure_Updated_Masterlist".to_string(),
            photo_archive: "Updated_Photos".to_string(),
            change_log: "change_log.txt".to_string(),
            org_workbook: "Updated_Organisations_Masterlist".to_string(),
            directory_listing: "staff_directory.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Artifact names in the order they were written.
    pub written: Vec<String>,
    pub rows: usize,
    pub blanked: usize,
    /// Entries in the photo archive, when one was written.
    pub photos: Option<usize>,
}

/// Tracks which artifacts made it out, so a failure can report them.
#[derive(Default)]
struct Progress {
    written: Vec<String>,
}

impl Progress {
    fn step<T>(&mut self, name: &str, result: StoreResult<T>) -> Result<T, ExportError> {
        match result {
            Ok(value) => {
                self.written.push(name.to_string());
                Ok(value)
            }
            Err(source) => Err(self.fail(name, source)),
        }
    }

    fn fail(&mut self, name: &str, source: StoreError) -> ExportError {
        tracing::error!(artifact = name, written = ?self.written, error = %source, "export failed");
        ExportError {
            failed: name.to_string(),
            written: std::mem::take(&mut self.written),
            source,
        }
    }
}

/// Rebuilds the workbook sheet list: sheets in `replaced` get the merged
/// rows, every other sheet is copied through unchanged.
fn workbook_sheets(
    store: &dyn TabularStore,
    replaced: &[(&SheetData, &[Row])],
) -> StoreResult<Vec<SheetOutput>> {
    let mut sheets = Vec::new();
    for name in store.sheet_names() {
        let merged = replaced
            .iter()
            .find(|(sheet, _)| sheet.is_writable() && sheet.name.as_deref() == Some(name.as_str()));
        match merged {
            Some((sheet, rows)) => sheets.push(SheetOutput::from_rows(&name, &sheet.header, rows)),
            None => sheets.push(SheetOutput::from_grid(&name, store.read_grid(&name)?)),
        }
    }
    Ok(sheets)
}

/// Staged rows need a loaded sheet to land in. Exporting without one would
/// drop them while the ledger is cleared.
fn check_person_sheets(snapshot: &Snapshot, persons: &PersonLedger) -> StoreResult<()> {
    let has_rows = !persons.new_persons().is_empty() || !persons.edits().is_empty();
    let has_staff = persons
        .new_persons()
        .iter()
        .any(|entry| !entry.staff.is_empty())
        || persons.edits().values().any(|entry| !entry.staff.is_empty());
    if has_rows && !snapshot.persons().is_writable() {
        return Err(StoreError::message(
            "workbook has no person sheet for the staged person changes",
        ));
    }
    if has_staff && !snapshot.staff().is_writable() {
        return Err(StoreError::message(
            "workbook has no staff sheet for the staged affiliations",
        ));
    }
    Ok(())
}

fn check_org_sheets(snapshot: &Snapshot, orgs: &OrgLedger) -> StoreResult<()> {
    if !orgs.org_edits().is_empty() && !snapshot.organisations().is_writable() {
        return Err(StoreError::message(
            "workbook has no organisation sheet for the staged organisation edits",
        ));
    }
    if !orgs.new_edges().is_empty() && !snapshot.hierarchy().is_writable() {
        return Err(StoreError::message(
            "workbook has no hierarchy sheet for the staged relationships",
        ));
    }
    Ok(())
}

fn write_photos(
    session: &StagingSession,
    photos_in: Option<&dyn ArchiveReader>,
    sink: &mut dyn ArtifactSink,
    name: &str,
) -> StoreResult<usize> {
    let persons = &session.ledger().persons;
    let contents = reconcile_photos(
        photos_in,
        persons.photo_replacements(),
        persons.new_person_photos(),
    )?;
    let mut writer = sink.archive_writer(name)?;
    for (filename, bytes) in &contents {
        writer.add_entry(filename, bytes)?;
    }
    writer.finish()
}

pub fn export_people(
    session: &mut StagingSession,
    store: &dyn TabularStore,
    photos_in: Option<&dyn ArchiveReader>,
    sink: &mut dyn ArtifactSink,
    names: &ExportNames,
) -> Result<ExportReport, ExportError> {
    export_people_at(
        session,
        store,
        photos_in,
        sink,
        names,
        Local::now().naive_local(),
    )
}

/// Writes the merged workbook, the change log and, when photos changed, the
/// photo archive. The person ledger is cleared only once all of them are
/// written.
pub fn export_people_at(
    session: &mut StagingSession,
    store: &dyn TabularStore,
    photos_in: Option<&dyn ArchiveReader>,
    sink: &mut dyn ArtifactSink,
    names: &ExportNames,
    generated: NaiveDateTime,
) -> Result<ExportReport, ExportError> {
    let mut progress = Progress::default();
    let snapshot = session.snapshot();
    let persons = &session.ledger().persons;
    check_person_sheets(snapshot, persons).map_err(|err| progress.fail(&names.workbook, err))?;
    let merged = merge_people(snapshot, persons);

    let sheets = workbook_sheets(
        store,
        &[
            (snapshot.persons(), merged.persons.as_slice()),
            (snapshot.staff(), merged.staff.as_slice()),
        ],
    )
    .map_err(|err| progress.fail(&names.workbook, err))?;
    progress.step(&names.workbook, sink.write_workbook(&names.workbook, &sheets))?;

    let log = change_log_document(persons, generated);
    progress.step(&names.change_log, sink.write_text(&names.change_log, &log))?;

    let photos = if persons.has_photo_changes() {
        let count = progress.step(
            &names.photo_archive,
            write_photos(session, photos_in, sink, &names.photo_archive),
        )?;
        Some(count)
    } else {
        None
    };

    let report = ExportReport {
        written: progress.written,
        rows: merged.persons.len(),
        blanked: merged.blanked_persons,
        photos,
    };
    session.ledger_mut().persons.clear();
    tracing::info!(
        written = ?report.written,
        rows = report.rows,
        blanked = report.blanked,
        "person export complete"
    );
    Ok(report)
}

/// Writes the organisation workbook with staged organisation edits and
/// hierarchy changes applied, description rows restored above the data.
pub fn export_organisations(
    session: &mut StagingSession,
    store: &dyn TabularStore,
    sink: &mut dyn ArtifactSink,
    names: &ExportNames,
) -> Result<ExportReport, ExportError> {
    let mut progress = Progress::default();
    let snapshot = session.snapshot();
    let orgs = &session.ledger().orgs;
    check_org_sheets(snapshot, orgs).map_err(|err| progress.fail(&names.org_workbook, err))?;

    let with_description = |sheet: &SheetData, rows: Vec<Row>| -> Vec<Row> {
        sheet.description.iter().cloned().chain(rows).collect()
    };
    let org_rows = with_description(
        snapshot.organisations(),
        merge_organisations(snapshot, orgs),
    );
    let edge_rows = with_description(snapshot.hierarchy(), merge_hierarchy(snapshot, orgs));

    let sheets = workbook_sheets(
        store,
        &[
            (snapshot.organisations(), org_rows.as_slice()),
            (snapshot.hierarchy(), edge_rows.as_slice()),
        ],
    )
    .map_err(|err| progress.fail(&names.org_workbook, err))?;
    progress.step(
        &names.org_workbook,
        sink.write_workbook(&names.org_workbook, &sheets),
    )?;

    let report = ExportReport {
        written: progress.written,
        rows: org_rows.len(),
        blanked: 0,
        photos: None,
    };
    session.ledger_mut().orgs.clear();
    tracing::info!(written = ?report.written, edges = edge_rows.len(), "organisation export complete");
    Ok(report)
}
