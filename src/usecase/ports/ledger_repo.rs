use crate::domain::entities::ledger::StagingLedger;
use crate::errors::StoreResult;

/// Keeps staged work across restarts.
pub trait LedgerRepository {
    fn init(&self) -> StoreResult<()>;

    /// Replaces whatever was stored with `ledger`.
    fn save(&self, ledger: &StagingLedger) -> StoreResult<()>;

    /// The stored ledger, or an empty one when nothing was saved.
    fn load(&self) -> StoreResult<StagingLedger>;

    fn clear(&self) -> StoreResult<()>;
}
