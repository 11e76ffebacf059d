//! Batch export for a masterlist workbook.
//!
//! Staging is done through the library (`StagingSession`) and persisted in
//! the ledger database. Each run loads the workbook, exports whatever is
//! staged there, and writes the staff directory listing, plus one
//! organisation's members workbook when `MASTERLIST_ROSTER_ORG` is set.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use masterlist::config::Config;
use masterlist::infra::archive::dir::DirArchive;
use masterlist::infra::export::output_dir::OutputDir;
use masterlist::infra::import::csv::CsvStore;
use masterlist::infra::import::xlsx::XlsxStore;
use masterlist::infra::sqlite::repo::SqliteLedgerRepo;
use masterlist::usecase::ports::archive::ArchiveReader;
use masterlist::usecase::ports::ledger_repo::LedgerRepository;
use masterlist::usecase::ports::tabular::TabularStore;
use masterlist::usecase::services::export_service::{export_organisations, export_people};
use masterlist::domain::roster::Roster;
use masterlist::usecase::services::load_service::load_snapshot;
use masterlist::usecase::services::roster_service::{export_directory_listing, export_members};
use masterlist::usecase::services::staging_service::StagingSession;

fn open_workbook(path: &Path) -> Result<Box<dyn TabularStore>> {
    if path.is_dir() {
        Ok(Box::new(CsvStore::open(path)?))
    } else {
        Ok(Box::new(XlsxStore::open(path)?))
    }
}

fn run(config: &Config) -> Result<()> {
    let workbook_path = config
        .workbook_path
        .as_deref()
        .ok_or_else(|| anyhow!("MASTERLIST_WORKBOOK is not set"))?;
    let store = open_workbook(workbook_path)?;
    let snapshot = load_snapshot(store.as_ref()).context("failed to load workbook")?;
    let roster = Roster::build(&snapshot);

    let photos = config
        .photos_path
        .as_deref()
        .map(DirArchive::open)
        .transpose()
        .context("failed to open photo folder")?;

    let repo = SqliteLedgerRepo::new(&config.ledger_db_path);
    repo.init()?;
    let ledger = repo.load()?;
    let mut session = StagingSession::new(snapshot, ledger, config.include_restricted);

    let mut sink = OutputDir::create(&config.output_dir)?;
    let people = export_people(
        &mut session,
        store.as_ref(),
        photos.as_ref().map(|archive| archive as &dyn ArchiveReader),
        &mut sink,
        &config.export_names,
    );
    // Whatever the outcome, persist what is still staged.
    repo.save(session.ledger())?;
    let people = people?;
    tracing::info!(written = ?people.written, photos = ?people.photos, "people exported");

    let snapshot = session.snapshot();
    if snapshot.organisations().is_writable() && snapshot.hierarchy().is_writable() {
        let orgs = export_organisations(
            &mut session,
            store.as_ref(),
            &mut sink,
            &config.export_names,
        );
        repo.save(session.ledger())?;
        let orgs = orgs?;
        tracing::info!(written = ?orgs.written, "organisations exported");
    }

    export_directory_listing(&roster, &mut sink, &config.export_names.directory_listing)?;
    if let Some(org_id) = config.roster_org.as_deref() {
        export_members(&roster, org_id, &mut sink)?;
    }

    tracing::info!(output = %sink.root().display(), "export finished");
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(ledger = %config.ledger_db_path.display(), "starting masterlist export");
    run(&config)
}
