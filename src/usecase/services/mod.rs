pub mod export_service;
pub mod load_service;
pub mod roster_service;
pub mod staging_service;
