use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::ValueEnum;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_BATCH_DIR: &str = "batched_sql";

/// How batch statements are grouped into transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransactionMode {
    /// Commit after every batch. A failure leaves earlier batches applied.
    #[default]
    PerBatch,
    /// One transaction for the whole load.
    AllOrNothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Driver {
    #[default]
    Postgres,
    Mysql,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub driver: Driver,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub source_dir: PathBuf,
    pub batch_dir: PathBuf,
    pub batch_size: NonZeroUsize,
    pub transaction_mode: TransactionMode,
    /// Skip batches whose sequence number is at or below this value.
    pub resume_after: Option<u64>,
    /// Treat a failed table creation as fatal instead of logging it and
    /// continuing with the inserts.
    pub abort_on_table_error: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            batch_dir: PathBuf::from(DEFAULT_BATCH_DIR),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            transaction_mode: TransactionMode::default(),
            resume_after: None,
            abort_on_table_error: false,
        }
    }
}
