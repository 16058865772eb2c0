use rusqlite::{Connection, Error as SqliteError};

use crate::error::BatchError;
use crate::types::{CellValue, StatementEntry};

use super::params::bind_all;
use super::query::extract_row;

/// Classified outcome of running one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    /// Prepare, bind, or step failed; carries the engine's error message.
    Failed { message: String },
    /// The first step reported done without producing a row.
    Command {
        total_changes: i64,
        rows_affected: i64,
        last_insert_rowid: i64,
    },
    /// The statement produced at least one row.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
}

impl StatementOutcome {
    fn failed(err: &SqliteError) -> Self {
        StatementOutcome::Failed {
            message: engine_message(err),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StatementOutcome::Failed { .. } => "error",
            StatementOutcome::Command { .. } => "command",
            StatementOutcome::Rows { .. } => "rows",
        }
    }
}

/// The message SQLite reported for a failure, without rusqlite's wrapping.
#[must_use]
pub fn engine_message(err: &SqliteError) -> String {
    match err {
        SqliteError::SqliteFailure(_, Some(message)) => message.clone(),
        SqliteError::SqliteFailure(code, None) => code.to_string(),
        SqliteError::SqlInputError { msg, .. } => msg.clone(),
        other => other.to_string(),
    }
}

/// Connection-wide count of rows modified since the connection was opened.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the counter cannot be read.
pub fn total_changes(conn: &Connection) -> Result<i64, SqliteError> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}

/// Drive one statement through prepare, bind, and step and classify the result.
///
/// SQL failures are returned as [`StatementOutcome::Failed`]. The prepared statement is
/// finalized before this function returns on every path.
///
/// # Errors
///
/// Returns `BatchError` only for failures outside the statement's own outcome, such as reading
/// the change counter.
pub fn run_statement(
    conn: &Connection,
    entry: &StatementEntry,
) -> Result<StatementOutcome, BatchError> {
    let previous_total_changes = total_changes(conn)?;

    let mut stmt = match conn.prepare(&entry.sql) {
        Ok(stmt) => stmt,
        Err(err) => return Ok(StatementOutcome::failed(&err)),
    };

    if let Err(err) = bind_all(&mut stmt, &entry.binds) {
        return Ok(StatementOutcome::failed(&err));
    }

    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = columns.len();

    let mut rows_iter = stmt.raw_query();

    let first = match rows_iter.next() {
        Ok(Some(row)) => extract_row(row, column_count)?,
        Ok(None) => {
            drop(rows_iter);
            let total_changes = total_changes(conn)?;
            return Ok(StatementOutcome::Command {
                total_changes,
                rows_affected: total_changes - previous_total_changes,
                last_insert_rowid: conn.last_insert_rowid(),
            });
        }
        Err(err) => return Ok(StatementOutcome::failed(&err)),
    };

    let mut rows = vec![first];
    loop {
        match rows_iter.next() {
            Ok(Some(row)) => rows.push(extract_row(row, column_count)?),
            Ok(None) => break,
            // a step failure after rows were produced still fails the whole entry
            Err(err) => return Ok(StatementOutcome::failed(&err)),
        }
    }

    Ok(StatementOutcome::Rows { columns, rows })
}
