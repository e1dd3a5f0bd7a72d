use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::batcher::Batch;
use crate::Result;

const PART_PREFIX: &str = "part_";
const PART_EXTENSION: &str = ".sql";

/// A batch file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUnit {
    pub sequence: u64,
    pub path: PathBuf,
}

/// Directory of `part_<n>.sql` files, one per batch.
#[derive(Debug)]
pub struct BatchFileStore {
    dir: PathBuf,
}

impl BatchFileStore {
    /// Creates an empty store at `dir`, discarding whatever a previous run left there.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        purge_dir(&dir)?;
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the batch and syncs it before returning.
    pub fn put(&self, batch: &Batch) -> Result<PathBuf> {
        let path = self.dir.join(part_name(batch.sequence));
        let mut file = File::create(&path)?;
        file.write_all(batch.statement.as_bytes())?;
        file.sync_all()?;
        debug!("Wrote batch {} to {}", batch.sequence, path.display());
        Ok(path)
    }

    /// Batch files sorted by sequence number. Files not named `part_<n>.sql` are skipped.
    pub fn list_in_order(&self) -> Result<Vec<BatchUnit>> {
        let mut units = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let sequence = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_part_name);
            if let Some(sequence) = sequence {
                units.push(BatchUnit { sequence, path });
            }
        }
        units.sort_by_key(|unit| unit.sequence);
        Ok(units)
    }

    pub fn read(&self, unit: &BatchUnit) -> Result<String> {
        Ok(fs::read_to_string(&unit.path)?)
    }

    pub fn purge(&self) -> Result<()> {
        purge_dir(&self.dir)
    }
}

/// Removes `dir` and its contents. A missing directory is fine.
pub fn purge_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!("Removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn part_name(sequence: u64) -> String {
    format!("{PART_PREFIX}{sequence}{PART_EXTENSION}")
}

fn parse_part_name(name: &str) -> Option<u64> {
    name.strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_EXTENSION)?
        .parse()
        .ok()
}
