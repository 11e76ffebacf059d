//! Error types for staging, storage adapters and export.

/// A staging action was rejected. The ledger is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("restricted organisation: {0}")]
    Visibility(String),
}

/// Failure reading from or writing to an external collaborator
/// (spreadsheet, photo archive, ledger database).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Message(String),
}

impl StoreError {
    pub fn message(msg: impl Into<String>) -> Self {
        StoreError::Message(msg.into())
    }
}

/// An export stopped part way. Artifacts listed in `written` were already
/// produced and are not rolled back; the ledger is kept so the export can be
/// retried.
#[derive(Debug, thiserror::Error)]
#[error("export failed while writing {failed} (already written: {written:?}): {source}")]
pub struct ExportError {
    pub failed: String,
    pub written: Vec<String>,
    #[source]
    pub source: StoreError,
}

pub type StagingResult<T> = Result<T, StagingError>;
pub type StoreResult<T> = Result<T, StoreError>;
