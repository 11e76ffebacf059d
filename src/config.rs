//! Runtime configuration, read from `MASTERLIST_*` environment variables
//! (a `.env` file is honoured).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

use crate::usecase::services::export_service::ExportNames;

pub const DEFAULT_PHOTO: &str = "UMSLlouie2.png";

#[derive(Debug, Clone)]
pub struct Config {
    /// `.xlsx` workbook, or a directory of `<sheet>.csv` files.
    pub workbook_path: Option<PathBuf>,
    /// Folder holding the current profile photos.
    pub photos_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Where staged work is kept between runs.
    pub ledger_db_path: PathBuf,
    pub export_names: ExportNames,
    /// `ProfilePhoto` given to new persons without an upload.
    pub default_photo: String,
    pub include_restricted: bool,
    /// Organisation whose members are exported as their own workbook.
    pub roster_org: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

pub fn default_ledger_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "masterlist")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("ledger.sqlite"))
}

fn flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let workbook_path = env::var("MASTERLIST_WORKBOOK").ok().map(PathBuf::from);
        let photos_path = env::var("MASTERLIST_PHOTOS").ok().map(PathBuf::from);
        let output_dir = env::var("MASTERLIST_OUTPUT_DIR")
            .unwrap_or_else(|_| "./output".to_string())
            .into();
        let ledger_db_path = match env::var("MASTERLIST_LEDGER_DB") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_ledger_db_path()?,
        };

        let defaults = ExportNames::default();
        let export_names = ExportNames {
            workbook: env::var("MASTERLIST_WORKBOOK_NAME").unwrap_or(defaults.workbook),
            photo_archive: env::var("MASTERLIST_PHOTO_ARCHIVE_NAME")
                .unwrap_or(defaults.photo_archive),
            change_log: env::var("MASTERLIST_CHANGE_LOG_NAME").unwrap_or(defaults.change_log),
            org_workbook: env::var("MASTERLIST_ORG_WORKBOOK_NAME")
                .unwrap_or(defaults.org_workbook),
            directory_listing: env::var("MASTERLIST_DIRECTORY_LISTING_NAME")
                .unwrap_or(defaults.directory_listing),
        };

        let default_photo =
            env::var("MASTERLIST_DEFAULT_PHOTO").unwrap_or_else(|_| DEFAULT_PHOTO.to_string());
        let include_restricted = env::var("MASTERLIST_INCLUDE_RESTRICTED")
            .map(|value| flag(&value))
            .unwrap_or(false);
        let roster_org = env::var("MASTERLIST_ROSTER_ORG")
            .ok()
            .filter(|id| !id.trim().is_empty());
        let log_level = env::var("MASTERLIST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            workbook_path,
            photos_path,
            output_dir,
            ledger_db_path,
            export_names,
            default_photo,
            include_restricted,
            roster_org,
            log_level,
        })
    }
}
