use std::path::PathBuf;

use crate::domain::entities::ledger::StagingLedger;
use crate::errors::{StoreError, StoreResult};
use crate::infra::sqlite::queries::{clear_ledger, load_ledger, save_ledger};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::ledger_repo::LedgerRepository;

pub struct SqliteLedgerRepo {
    pub db_path: PathBuf,
}

impl SqliteLedgerRepo {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl LedgerRepository for SqliteLedgerRepo {
    fn init(&self) -> StoreResult<()> {
        init_db(&self.db_path).map_err(|err| StoreError::Message(err.to_string()))
    }

    fn save(&self, ledger: &StagingLedger) -> StoreResult<()> {
        save_ledger(&self.db_path, ledger).map_err(|err| StoreError::Message(err.to_string()))
    }

    fn load(&self) -> StoreResult<StagingLedger> {
        load_ledger(&self.db_path).map_err(|err| StoreError::Message(err.to_string()))
    }

    fn clear(&self) -> StoreResult<()> {
        clear_ledger(&self.db_path).map_err(|err| StoreError::Message(err.to_string()))
    }
}
