pub mod anonymize;
pub mod row;

pub use row::{CsvRow, HEADER};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::aggregate::AggregateResult;

const DELIMITER: char = ',';

/// Free-text columns, quoted unconditionally.
const ALWAYS_QUOTED: [&str; 2] = ["Message", "Description"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// File name of the export for `repo_name`.
pub fn file_name(repo_name: &str) -> String {
    format!("{}_data.csv", repo_name)
}

/// Project every record of `result` into export rows.
pub fn rows(repo_name: &str, result: &AggregateResult) -> Vec<CsvRow> {
    row::records(result)
        .map(|record| record.to_row(repo_name))
        .collect()
}

/// Render rows as CSV text: header line first, `\n` line endings.
pub fn to_csv(rows: &[CsvRow]) -> String {
    let mut out = String::new();
    push_line(&mut out, HEADER, |_| false);
    for row in rows {
        push_line(&mut out, row.cells(), |column| {
            ALWAYS_QUOTED.contains(&HEADER[column])
        });
    }
    out
}

/// Write `{repo_name}_data.csv` into `dir` and return its path.
///
/// With `anonymize` set, participant and repository codes replace the real
/// names before anything is written.
#[instrument(skip(result), fields(records = result.total_records()))]
pub fn export_to_file(
    repo_name: &str,
    result: &AggregateResult,
    dir: &Path,
    anonymize: bool,
) -> Result<PathBuf, ExportError> {
    let mut rows = rows(repo_name, result);
    if anonymize {
        let codes = anonymize::Codebook::from_rows(&rows);
        debug!(
            participants = codes.participant_count(),
            repositories = codes.repository_count(),
            "anonymizing export"
        );
        codes.apply(&mut rows);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(repo_name));
    std::fs::write(&path, to_csv(&rows))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote export");
    Ok(path)
}

fn push_line<'a, I, Q>(out: &mut String, cells: I, always_quote: Q)
where
    I: IntoIterator<Item = &'a str>,
    Q: Fn(usize) -> bool,
{
    for (column, cell) in cells.into_iter().enumerate() {
        if column > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&escape(cell, always_quote(column)));
    }
    out.push('\n');
}

/// Standard CSV quoting: wrap in double quotes and double embedded quotes
/// when forced or when the value contains a delimiter, quote or line break.
pub fn escape(value: &str, force: bool) -> String {
    let needs_quotes = force
        || value.contains(|c: char| c == DELIMITER || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
