use crate::domain::catalog::Catalog;
use crate::domain::entities::record::{columns, field, Row};
use crate::domain::entities::snapshot::{SheetData, Snapshot};
use crate::errors::StoreResult;
use crate::usecase::ports::tabular::{rows_from_grid, SheetKind, TabularStore};

const DESCRIPTION_MIN_LEN: usize = 50;

fn load_sheet(
    store: &dyn TabularStore,
    kind: SheetKind,
    sheet_names: &[String],
) -> StoreResult<SheetData> {
    let Some(name) = kind.find(sheet_names) else {
        tracing::warn!(?kind, "sheet not found; loading it empty");
        return Ok(SheetData::default());
    };
    let grid = store.read_grid(name)?;
    let header = grid.first().cloned().unwrap_or_default();
    let rows = rows_from_grid(&grid);
    tracing::debug!(sheet = name, rows = rows.len(), "loaded sheet");
    Ok(SheetData::new(name, header, rows))
}

/// Organisation sheets may carry a row of column descriptions directly
/// under the header.
pub fn is_org_description(row: &Row) -> bool {
    let text = format!(
        "{}{}",
        field(row, columns::VISIBILITY),
        field(row, columns::NAME_EN)
    );
    text.chars().count() > DESCRIPTION_MIN_LEN
        || field(row, columns::ORGANISATION_ID).contains("unique identifier")
}

pub fn is_hierarchy_description(row: &Row) -> bool {
    field(row, columns::PARENT_ORGANISATION_ID)
        .to_lowercase()
        .contains("id entered")
}

fn split_description(sheet: &mut SheetData, is_description: fn(&Row) -> bool) {
    if sheet.rows.first().is_some_and(is_description) {
        sheet.description = Some(sheet.rows.remove(0));
    }
}

/// Reads every sheet role the workbook has into an immutable snapshot.
/// Description rows are held aside so edge indices count data rows only.
pub fn load_snapshot(store: &dyn TabularStore) -> StoreResult<Snapshot> {
    let sheet_names = store.sheet_names();

    let persons = load_sheet(store, SheetKind::Person, &sheet_names)?;
    let staff = load_sheet(store, SheetKind::Staff, &sheet_names)?;
    let mut organisations = load_sheet(store, SheetKind::Organisations, &sheet_names)?;
    let mut hierarchy = load_sheet(store, SheetKind::Hierarchy, &sheet_names)?;

    split_description(&mut organisations, is_org_description);
    split_description(&mut hierarchy, is_hierarchy_description);

    let snapshot = Snapshot::new(persons, staff, organisations, hierarchy);
    tracing::info!(
        persons = snapshot.persons().rows.len(),
        staff = snapshot.staff().rows.len(),
        organisations = snapshot.directory().len(),
        edges = snapshot.edges().len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Job title and employment type suggestions for the person editor.
pub fn load_catalog(store: &dyn TabularStore, snapshot: &Snapshot) -> StoreResult<Catalog> {
    let sheet_names = store.sheet_names();
    let classification = match SheetKind::Classification.find(&sheet_names) {
        Some(name) => Some(store.read_grid(name)?),
        None => None,
    };
    Ok(Catalog::build(
        &snapshot.staff().rows,
        classification.as_deref(),
    ))
}
