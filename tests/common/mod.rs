#![allow(dead_code)]

use std::fs;
use std::path::Path;

use sql_batch_loader::error::LoadError;
use sql_batch_loader::session::SqlSession;
use sql_batch_loader::Result;

/// In-memory session that keeps uncommitted statements apart from committed ones.
#[derive(Default)]
pub struct RecordingSession {
    pub attempted: Vec<String>,
    pub committed: Vec<String>,
    pending: Vec<String>,
    fail_on: Vec<String>,
    rollback_fails: bool,
}

impl RecordingSession {
    /// Any statement containing `needle` fails.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: vec![needle.to_string()],
            ..Default::default()
        }
    }

    /// Like `failing_on`, and `ROLLBACK` fails too, as on a dropped connection.
    pub fn disconnecting_on(needle: &str) -> Self {
        Self {
            rollback_fails: true,
            ..Self::failing_on(needle)
        }
    }

    pub fn committed_containing(&self, needle: &str) -> usize {
        self.committed.iter().filter(|s| s.contains(needle)).count()
    }

    pub fn attempted_containing(&self, needle: &str) -> usize {
        self.attempted.iter().filter(|s| s.contains(needle)).count()
    }
}

impl SqlSession for RecordingSession {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        match sql {
            "BEGIN" => self.pending.clear(),
            "COMMIT" => self.committed.append(&mut self.pending),
            "ROLLBACK" => {
                self.pending.clear();
                if self.rollback_fails {
                    return Err(LoadError::StringError("connection lost".into()));
                }
            }
            _ => {
                self.attempted.push(sql.to_string());
                if self.fail_on.iter().any(|needle| sql.contains(needle.as_str())) {
                    return Err(LoadError::StringError(format!("rejected: {}", sql.trim())));
                }
                self.pending.push(sql.to_string());
            }
        }
        Ok(0)
    }
}

/// `create table t (a int);` followed by an insert of `rows` single-column tuples.
pub fn dump_with_rows(rows: usize) -> String {
    let mut dump = String::from("create table t (a int);\ninsert into t (a) values\n");
    let tuples = (1..=rows).map(|i| format!("({i})")).collect::<Vec<_>>();
    dump.push_str(&tuples.join(",\n"));
    dump.push_str(";\n");
    dump
}

pub fn write_dump(dir: &Path, dump: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("dump.sql"), dump).unwrap();
}
