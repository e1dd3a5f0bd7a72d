//! End-to-end load: find the dump, batch it to disk, run it, clean up.

use std::path::PathBuf;

use log::{error, info, warn};

use crate::batcher::InsertStatement;
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::executor::LoadExecutor;
use crate::session::SqlSession;
use crate::splitter;
use crate::store::BatchFileStore;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub source: PathBuf,
    pub batches_written: usize,
    pub rows_written: usize,
    /// Set when table creation failed but the load went ahead anyway.
    pub table_error: Option<String>,
    pub batches_applied: usize,
    pub last_applied: Option<u64>,
}

pub async fn run<S: SqlSession>(config: &LoaderConfig, session: &mut S) -> Result<LoadReport> {
    let source = splitter::find_source_file(&config.source_dir)?;
    info!("Loading {}", source.display());
    let dump = splitter::read_dump(&source)?;
    let statements = splitter::split(&dump)?;
    let insert = InsertStatement::parse(&statements.insert)?;

    let store = BatchFileStore::create(&config.batch_dir)?;
    let mut report = LoadReport {
        source,
        ..Default::default()
    };
    let outcome = load(config, session, &statements.ddl, &insert, &store, &mut report).await;
    let purged = store.purge();

    match (outcome, purged) {
        (Ok(()), Ok(())) => Ok(report),
        (Ok(()), Err(e)) => Err(e),
        (Err(e), purged) => {
            if let Err(purge_error) = purged {
                warn!(
                    "Could not remove {}: {}",
                    config.batch_dir.display(),
                    purge_error
                );
            }
            Err(e)
        }
    }
}

async fn load<S: SqlSession>(
    config: &LoaderConfig,
    session: &mut S,
    ddl: &str,
    insert: &InsertStatement<'_>,
    store: &BatchFileStore,
    report: &mut LoadReport,
) -> Result<()> {
    for batch in insert.batches(config.batch_size) {
        store.put(&batch)?;
        report.batches_written += 1;
        report.rows_written += batch.rows;
    }
    info!(
        "Split {} rows into {} batches of up to {}",
        report.rows_written, report.batches_written, config.batch_size
    );

    let mut executor = LoadExecutor::new(session, config.transaction_mode);
    match executor.create_table(ddl).await {
        Ok(()) => {}
        Err(LoadError::TableCreation { source }) if !config.abort_on_table_error => {
            warn!("Continuing without a freshly created table");
            report.table_error = Some(source.to_string());
        }
        Err(e) => return Err(e),
    }

    match executor.insert_all(store, config.resume_after).await {
        Ok(summary) => {
            report.batches_applied = summary.applied;
            report.last_applied = summary.last_applied;
            Ok(())
        }
        Err(e) => {
            if let LoadError::BatchInsertion { last_applied, .. } = &e {
                match last_applied {
                    Some(n) => error!("Load stopped; rerun with --resume-after {} to continue", n),
                    None => error!("Load stopped before any batch was committed"),
                }
            }
            Err(e)
        }
    }
}
