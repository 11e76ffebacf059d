pub mod archive;
pub mod ledger_repo;
pub mod tabular;
