//! Chunking a bulk insert into bounded, independently executable statements.
//!
//! Rows are expected one tuple per line after the `values` keyword, each
//! carrying its own trailing `,`. The row that closes a batch gets its
//! separator replaced by `;`.

use std::num::NonZeroUsize;
use std::slice::Chunks;

use crate::error::LoadError;
use crate::Result;

const VALUES_KEYWORD: &str = "values";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Starts at 1.
    pub sequence: u64,
    pub rows: usize,
    pub statement: String,
}

/// An insert statement cut into its header and row payload.
#[derive(Debug, Clone)]
pub struct InsertStatement<'a> {
    header: String,
    rows: Vec<&'a str>,
}

impl<'a> InsertStatement<'a> {
    pub fn parse(insert: &'a str) -> Result<Self> {
        let at = find_values_keyword(insert)
            .ok_or_else(|| LoadError::Parse("insert statement has no `values` keyword".into()))?;
        let head = normalize_header(&insert[..at]);
        if head.is_empty() {
            return Err(LoadError::Parse(
                "insert statement has no header before `values`".into(),
            ));
        }
        let rows = insert[at + VALUES_KEYWORD.len()..]
            .lines()
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .collect();
        Ok(Self {
            header: format!("{head} {VALUES_KEYWORD}"),
            rows,
        })
    }

    /// `insert into ... (columns) values`
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn rows(&self) -> &[&'a str] {
        &self.rows
    }

    pub fn batches(&self, batch_size: NonZeroUsize) -> Batches<'_, 'a> {
        Batches {
            header: &self.header,
            groups: self.rows.chunks(batch_size.get()),
            next_sequence: 1,
        }
    }
}

pub struct Batches<'s, 'a> {
    header: &'s str,
    groups: Chunks<'s, &'a str>,
    next_sequence: u64,
}

impl Iterator for Batches<'_, '_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let group = self.groups.next()?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Some(Batch {
            sequence,
            rows: group.len(),
            statement: render(self.header, group),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

pub fn batch(insert: &str, batch_size: NonZeroUsize) -> Result<Vec<Batch>> {
    let statement = InsertStatement::parse(insert)?;
    Ok(statement.batches(batch_size).collect())
}

/// Collapses whitespace within each line but keeps the line breaks, so a
/// leading `--` comment still ends before the `insert into` clause.
fn normalize_header(head: &str) -> String {
    head.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte offset of the first standalone `values` keyword, ignoring ASCII case.
fn find_values_keyword(insert: &str) -> Option<usize> {
    let lowered = insert.to_ascii_lowercase();
    let bytes = lowered.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    lowered.match_indices(VALUES_KEYWORD).map(|(at, _)| at).find(|&at| {
        let end = at + VALUES_KEYWORD.len();
        let before = at == 0 || !is_word(bytes[at - 1]);
        let after = end == bytes.len() || !is_word(bytes[end]);
        before && after
    })
}

// `group` is never empty: it comes from `chunks`.
fn render(header: &str, group: &[&str]) -> String {
    let capacity = header.len() + group.iter().map(|row| row.len() + 1).sum::<usize>() + 2;
    let mut statement = String::with_capacity(capacity);
    statement.push_str(header);
    statement.push('\n');
    if let Some((last, body)) = group.split_last() {
        for row in body {
            statement.push_str(row);
            statement.push('\n');
        }
        statement.push_str(strip_separator(last));
    }
    statement.push_str(";\n");
    statement
}

fn strip_separator(row: &str) -> &str {
    row.trim_end()
        .trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
}
