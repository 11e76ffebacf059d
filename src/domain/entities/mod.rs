pub mod ledger;
pub mod organisation;
pub mod photo;
pub mod record;
pub mod snapshot;
