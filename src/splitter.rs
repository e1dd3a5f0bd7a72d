//! Locating the dump file and cutting it into its DDL and DML statements.
//!
//! Statements are separated by a plain split on `;`. The split is not aware of
//! string literals, so a `;` inside a quoted value ends the statement early.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::LoadError;
use crate::Result;

const SQL_EXTENSION: &str = "sql";
const STATEMENT_DELIMITER: char = ';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPair {
    pub ddl: String,
    pub insert: String,
}

/// Returns the `.sql` file in `dir`. The first one by name wins if there are several.
pub fn find_source_file(dir: &Path) -> Result<PathBuf> {
    info!("Seeking SQL file in {}", dir.display());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LoadError::SourceFileNotFound {
                dir: dir.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_sql_extension(&path) {
            candidates.push(path);
        }
    }
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            "Found {} SQL files in {}, using {}",
            candidates.len(),
            dir.display(),
            candidates[0].display()
        );
    }
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| LoadError::SourceFileNotFound {
            dir: dir.to_path_buf(),
        })
}

fn has_sql_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SQL_EXTENSION))
}

pub fn read_dump(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Splits a dump into its first two statements. Anything after the insert is ignored.
pub fn split(dump: &str) -> Result<StatementPair> {
    let mut statements = dump.split(STATEMENT_DELIMITER);
    let ddl = statements
        .next()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| LoadError::Parse("dump contains no table-creation statement".into()))?;
    let insert = statements
        .next()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| LoadError::Parse("dump contains no insert statement".into()))?;
    Ok(StatementPair {
        ddl: ddl.trim().to_string(),
        insert: insert.to_string(),
    })
}
