use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rusqlite::{params, Transaction};

use crate::domain::entities::ledger::{
    EditEntry, NewPersonEntry, OrgLedger, PersonLedger, StagingLedger,
};
use crate::domain::entities::organisation::{NewEdge, OrgEdit, Visibility};
use crate::domain::entities::photo::{PhotoPayload, PhotoReplacement};
use crate::domain::entities::record::Row;
use crate::infra::sqlite::schema::open_connection;

const NEW: &str = "new";
const EDIT: &str = "edit";
const PERSON_ROW: i64 = -1;

/// Cells of one staged entry: the person row and its staff rows.
#[derive(Default)]
struct EntryRows {
    person: Row,
    staff: BTreeMap<i64, Row>,
}

fn insert_entry(
    tx: &Transaction<'_>,
    kind: &str,
    position: usize,
    person_id: &str,
    person: &Row,
    staff: &[Row],
) -> Result<()> {
    tx.execute(
        "INSERT INTO staged_entry(kind, position, person_id) VALUES (?1, ?2, ?3)",
        params![kind, position as i64, person_id],
    )
    .with_context(|| format!("failed to insert staged entry: {person_id}"))?;

    let mut insert_field = tx
        .prepare(
            "INSERT INTO staged_field(kind, position, row_idx, col_idx, name, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .context("failed to prepare staged field insert")?;

    let rows = std::iter::once((PERSON_ROW, person))
        .chain(staff.iter().enumerate().map(|(idx, row)| (idx as i64, row)));
    for (row_idx, row) in rows {
        for (col_idx, (name, value)) in row.iter().enumerate() {
            insert_field
                .execute(params![
                    kind,
                    position as i64,
                    row_idx,
                    col_idx as i64,
                    name,
                    value
                ])
                .context("failed to insert staged field")?;
        }
    }
    Ok(())
}

fn insert_photo(
    tx: &Transaction<'_>,
    kind: &str,
    person_id: &str,
    filename: &str,
    bytes: &[u8],
    original_filename: Option<&str>,
) -> Result<()> {
    tx.execute(
        "INSERT INTO staged_photo(kind, person_id, filename, bytes, original_filename)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(kind, person_id) DO UPDATE SET
            filename = excluded.filename,
            bytes = excluded.bytes,
            original_filename = excluded.original_filename",
        params![kind, person_id, filename, bytes, original_filename],
    )
    .with_context(|| format!("failed to insert staged photo for {person_id}"))?;
    Ok(())
}

fn delete_all(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "
        DELETE FROM staged_field;
        DELETE FROM staged_entry;
        DELETE FROM staged_photo;
        DELETE FROM staged_edge;
        DELETE FROM staged_edge_deletion;
        DELETE FROM staged_org_edit;
        ",
    )
    .context("failed to clear staged tables")?;
    Ok(())
}

pub fn save_ledger(db_path: &Path, ledger: &StagingLedger) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start ledger save transaction")?;

    delete_all(&tx)?;

    let persons = &ledger.persons;
    for (position, entry) in persons.new_persons().iter().enumerate() {
        insert_entry(&tx, NEW, position, entry.id(), &entry.person, &entry.staff)?;
        if let Some(photo) = &entry.photo {
            insert_photo(&tx, NEW, entry.id(), &photo.filename, &photo.bytes, None)?;
        }
    }
    for (position, (id, entry)) in persons.edits().iter().enumerate() {
        insert_entry(&tx, EDIT, position, id, &entry.person, &entry.staff)?;
    }
    for (id, replacement) in persons.photo_replacements() {
        insert_photo(
            &tx,
            EDIT,
            id,
            &replacement.new_filename,
            &replacement.new_file,
            replacement.original_filename.as_deref(),
        )?;
    }

    let orgs = &ledger.orgs;
    for (position, edge) in orgs.new_edges().iter().enumerate() {
        tx.execute(
            "INSERT INTO staged_edge(position, parent, child) VALUES (?1, ?2, ?3)",
            params![position as i64, edge.parent, edge.child],
        )
        .context("failed to insert staged edge")?;
    }
    for original_index in orgs.deleted_edges() {
        tx.execute(
            "INSERT INTO staged_edge_deletion(original_index) VALUES (?1)",
            [*original_index as i64],
        )
        .context("failed to insert staged edge deletion")?;
    }
    for (position, (org_id, edit)) in orgs.org_edits().iter().enumerate() {
        tx.execute(
            "INSERT INTO staged_org_edit(position, org_id, name, visibility)
             VALUES (?1, ?2, ?3, ?4)",
            params![position as i64, org_id, edit.name, edit.visibility.as_str()],
        )
        .context("failed to insert staged org edit")?;
    }

    tx.commit().context("failed to commit ledger save")?;
    Ok(())
}

pub fn clear_ledger(db_path: &Path) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start ledger clear transaction")?;
    delete_all(&tx)?;
    tx.commit().context("failed to commit ledger clear")?;
    Ok(())
}

fn load_entries(
    conn: &rusqlite::Connection,
    kind: &str,
) -> Result<Vec<(String, EntryRows)>> {
    let mut entry_stmt = conn
        .prepare(
            "SELECT position, person_id
             FROM staged_entry
             WHERE kind = ?1
             ORDER BY position ASC",
        )
        .context("failed to prepare staged entry query")?;
    let entries = entry_stmt
        .query_map([kind], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .context("failed to query staged entries")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect staged entries")?;

    let mut field_stmt = conn
        .prepare(
            "SELECT row_idx, name, value
             FROM staged_field
             WHERE kind = ?1 AND position = ?2
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare staged field query")?;

    let mut loaded = Vec::with_capacity(entries.len());
    for (position, person_id) in entries {
        let fields = field_stmt
            .query_map(params![kind, position], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("failed to query staged fields")?;

        let mut rows = EntryRows::default();
        for field in fields {
            let (row_idx, name, value) = field.context("failed to read staged field")?;
            let row = if row_idx == PERSON_ROW {
                &mut rows.person
            } else {
                rows.staff.entry(row_idx).or_default()
            };
            row.insert(name, value);
        }
        loaded.push((person_id, rows));
    }
    Ok(loaded)
}

type StoredPhoto = (String, Vec<u8>, Option<String>);

fn load_photos(conn: &rusqlite::Connection, kind: &str) -> Result<IndexMap<String, StoredPhoto>> {
    let mut stmt = conn
        .prepare(
            "SELECT person_id, filename, bytes, original_filename
             FROM staged_photo
             WHERE kind = ?1
             ORDER BY rowid ASC",
        )
        .context("failed to prepare staged photo query")?;
    let rows = stmt
        .query_map([kind], |row| {
            Ok((
                row.get::<_, String>(0)?,
                (
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ),
            ))
        })
        .context("failed to query staged photos")?;

    let mut photos = IndexMap::new();
    for row in rows {
        let (person_id, photo) = row.context("failed to read staged photo")?;
        photos.insert(person_id, photo);
    }
    Ok(photos)
}

fn load_org_ledger(conn: &rusqlite::Connection) -> Result<OrgLedger> {
    let mut edge_stmt = conn
        .prepare("SELECT parent, child FROM staged_edge ORDER BY position ASC")
        .context("failed to prepare staged edge query")?;
    let new_edges = edge_stmt
        .query_map([], |row| {
            Ok(NewEdge {
                parent: row.get(0)?,
                child: row.get(1)?,
            })
        })
        .context("failed to query staged edges")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect staged edges")?;

    let mut deletion_stmt = conn
        .prepare("SELECT original_index FROM staged_edge_deletion")
        .context("failed to prepare staged deletion query")?;
    let deleted_edges = deletion_stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .context("failed to query staged deletions")?
        .map(|index| index.map(|index| index as usize))
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("failed to collect staged deletions")?;

    let mut edit_stmt = conn
        .prepare(
            "SELECT org_id, name, visibility
             FROM staged_org_edit
             ORDER BY position ASC",
        )
        .context("failed to prepare staged org edit query")?;
    let edits = edit_stmt
        .query_map([], |row| {
            let org_id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let visibility: String = row.get(2)?;
            Ok((
                org_id,
                OrgEdit {
                    name,
                    visibility: Visibility::parse(&visibility),
                },
            ))
        })
        .context("failed to query staged org edits")?;
    let mut org_edits = IndexMap::new();
    for edit in edits {
        let (org_id, edit) = edit.context("failed to read staged org edit")?;
        org_edits.insert(org_id, edit);
    }

    Ok(OrgLedger::from_parts(new_edges, deleted_edges, org_edits))
}

pub fn load_ledger(db_path: &Path) -> Result<StagingLedger> {
    let conn = open_connection(db_path)?;

    let mut new_photos = load_photos(&conn, NEW)?;
    let new_persons = load_entries(&conn, NEW)?
        .into_iter()
        .map(|(person_id, rows)| NewPersonEntry {
            person: rows.person,
            staff: rows.staff.into_values().collect(),
            photo: new_photos
                .shift_remove(&person_id)
                .map(|(filename, bytes, _)| PhotoPayload { filename, bytes }),
        })
        .collect();

    let edits = load_entries(&conn, EDIT)?
        .into_iter()
        .map(|(person_id, rows)| {
            let entry = EditEntry {
                person: rows.person,
                staff: rows.staff.into_values().collect(),
            };
            (person_id, entry)
        })
        .collect();

    let photo_replacements = load_photos(&conn, EDIT)?
        .into_iter()
        .map(|(person_id, (new_filename, new_file, original_filename))| {
            let replacement = PhotoReplacement {
                new_file,
                new_filename,
                original_filename,
            };
            (person_id, replacement)
        })
        .collect();

    let ledger = StagingLedger {
        persons: PersonLedger::from_parts(new_persons, edits, photo_replacements),
        orgs: load_org_ledger(&conn)?,
    };
    tracing::debug!(empty = ledger.is_empty(), "loaded staged ledger");
    Ok(ledger)
}
