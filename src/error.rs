use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no .sql file found in {}", .dir.display())]
    SourceFileNotFound { dir: PathBuf },
    #[error("malformed dump: {0}")]
    Parse(String),
    #[error("error creating table: {source}")]
    TableCreation {
        #[source]
        source: Box<LoadError>,
    },
    /// `last_applied` is the highest sequence number still committed, if any.
    #[error("error inserting batch {sequence}: {source}")]
    BatchInsertion {
        sequence: u64,
        last_applied: Option<u64>,
        #[source]
        source: Box<LoadError>,
    },
    #[error("{0}")]
    StringError(String),
    #[error("sqlx error: {sqlx:?}")]
    SqlxError {
        #[from]
        sqlx: sqlx::Error,
    },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Logger(#[from] log::SetLoggerError),
}
