//! Load a large SQL dump (one `create table` plus one bulk `insert`) by
//! splitting the insert into batches, executing them one by one and removing
//! the intermediate batch files afterwards.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use sql_batch_loader::config::{
    Credentials, Driver, LoaderConfig, TransactionMode, DEFAULT_BATCH_DIR, DEFAULT_SOURCE_DIR,
};
use sql_batch_loader::error::LoadError;
use sql_batch_loader::pipeline;
use sql_batch_loader::session::DbConnection;
use sql_batch_loader::store::purge_dir;
use sql_batch_loader::Result;

const ENV_FILE: &str = ".env";

#[derive(Parser)]
#[command(name = "sql-batch-loader")]
#[command(about = "Load a SQL dump into a database in bounded insert batches")]
struct Args {
    /// Directory holding the dump file
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,

    /// Scratch directory for batch files, removed when the run ends
    #[arg(long, default_value = DEFAULT_BATCH_DIR)]
    batch_dir: PathBuf,

    /// Rows per insert batch
    #[arg(short = 'b', long, env = "BATCH_SIZE", default_value = "1000")]
    batch_size: NonZeroUsize,

    #[arg(long, value_enum, default_value_t = TransactionMode::PerBatch)]
    transaction_mode: TransactionMode,

    /// Skip batches up to and including this sequence number
    #[arg(long)]
    resume_after: Option<u64>,

    /// Stop when the table cannot be created instead of inserting anyway
    #[arg(long)]
    abort_on_table_error: bool,

    #[arg(long, value_enum, default_value_t = Driver::Postgres)]
    driver: Driver,

    #[arg(long, env = "dbname")]
    dbname: String,

    #[arg(short = 'u', long, env = "user")]
    user: String,

    #[arg(long, env = "password", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "host", default_value = "127.0.0.1")]
    host: String,

    #[arg(short = 'p', long, env = "port", default_value = "5432")]
    port: u16,

    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Write logs to this file instead of the terminal
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn credentials(&self) -> Credentials {
        Credentials {
            driver: self.driver,
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }

    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            source_dir: self.source_dir.clone(),
            batch_dir: self.batch_dir.clone(),
            batch_size: self.batch_size,
            transaction_mode: self.transaction_mode,
            resume_after: self.resume_after,
            abort_on_table_error: self.abort_on_table_error,
        }
    }
}

#[tokio::main]
async fn main() {
    let start = Instant::now();
    load_env_file(Path::new(ENV_FILE));
    let args = Args::parse();
    if let Err(e) = setup_logger(&args) {
        eprintln!("Failed to set up logging: {}", e);
        std::process::exit(1);
    }

    let result = run(&args).await;
    info!("Execution time: {:.3} seconds", start.elapsed().as_secs_f64());
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let batch_dir = args.batch_dir.clone();
    ctrlc::set_handler(move || {
        purge_on_interrupt(&batch_dir);
        std::process::exit(130);
    })
    .map_err(|e| LoadError::StringError(e.to_string()))?;

    let mut conn = DbConnection::connect(&args.credentials()).await?;
    let outcome = pipeline::run(&args.loader_config(), &mut conn).await;
    let report = keep_load_outcome(outcome, conn.close().await)?;
    if let Some(e) = &report.table_error {
        info!("Table creation failed earlier: {}", e);
    }
    info!(
        "Loaded {} rows from {} in {} batches",
        report.rows_written,
        report.source.display(),
        report.batches_applied
    );
    Ok(())
}

/// Sets variables from a dotenv file without overriding ones already in the
/// environment. Returns whether the file was read.
fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => true,
        Err(e) if e.not_found() => false,
        Err(e) => {
            eprintln!("Ignoring {}: {}", path.display(), e);
            false
        }
    }
}

/// A close failure is logged; the load's own result is what gets reported.
fn keep_load_outcome<T>(outcome: Result<T>, closed: Result<()>) -> Result<T> {
    if let Err(e) = closed {
        warn!("Failed to close the database connection: {}", e);
    }
    outcome
}

fn purge_on_interrupt(batch_dir: &Path) {
    if let Err(e) = purge_dir(batch_dir) {
        eprintln!("Failed to remove {}: {}", batch_dir.display(), e);
    }
}

fn setup_logger(args: &Args) -> Result<()> {
    match &args.log_file {
        Some(path) => simple_logging::log_to_file(path, args.log_level)?,
        None => simple_logger::SimpleLogger::new()
            .with_utc_timestamps()
            .with_colors(true)
            .with_level(args.log_level)
            .init()?,
    }
    Ok(())
}
