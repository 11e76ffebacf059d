use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

/// Staged person entries and their rows are stored cell by cell:
/// `staged_entry` holds one line per new person (`kind = 'new'`) or edit
/// (`kind = 'edit'`) in ledger order, and `staged_field` holds every cell of
/// the entry's person row (`row_idx = -1`) and staff rows (`row_idx >= 0`).
pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS staged_entry (
            kind        TEXT NOT NULL,
            position    INTEGER NOT NULL,
            person_id   TEXT NOT NULL,
            PRIMARY KEY (kind, position)
        );

        CREATE TABLE IF NOT EXISTS staged_field (
            kind        TEXT NOT NULL,
            position    INTEGER NOT NULL,
            row_idx     INTEGER NOT NULL,
            col_idx     INTEGER NOT NULL,
            name        TEXT NOT NULL,
            value       TEXT NOT NULL,
            PRIMARY KEY (kind, position, row_idx, col_idx),
            FOREIGN KEY (kind, position) REFERENCES staged_entry(kind, position)
        );

        CREATE TABLE IF NOT EXISTS staged_photo (
            kind              TEXT NOT NULL,
            person_id         TEXT NOT NULL,
            filename          TEXT NOT NULL,
            bytes             BLOB NOT NULL,
            original_filename TEXT,
            PRIMARY KEY (kind, person_id)
        );

        CREATE TABLE IF NOT EXISTS staged_edge (
            position    INTEGER PRIMARY KEY,
            parent      TEXT NOT NULL,
            child       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS staged_edge_deletion (
            original_index INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS staged_org_edit (
            position    INTEGER NOT NULL,
            org_id      TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            visibility  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_staged_field_entry
            ON staged_field(kind, position);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
