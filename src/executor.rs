use std::iter::FusedIterator;
use std::slice;

use rusqlite::Connection;

use crate::error::BatchError;
use crate::results::{BatchResponse, EntryResult, OutboundMessage};
use crate::sqlite::runner::{StatementOutcome, run_statement};
use crate::stream::{BoundedEmitter, UnboundedEmitter};
use crate::types::{BatchRequest, StatementEntry};

fn run_entry(
    conn: &Connection,
    index: usize,
    entry: &StatementEntry,
) -> Result<EntryResult, BatchError> {
    let outcome = run_statement(conn, entry)?;
    match &outcome {
        StatementOutcome::Failed { message } => {
            tracing::warn!(index, sql = %entry.sql, %message, "statement failed");
        }
        other => {
            tracing::debug!(index, outcome = other.kind(), "statement finished");
        }
    }
    Ok(EntryResult::from_outcome(outcome))
}

/// Execute every statement of `request` in order and collect one result per entry.
///
/// A failing statement becomes an error entry and execution continues with the next one.
/// No transaction is opened; include `BEGIN`/`COMMIT` entries for atomicity.
///
/// ```rust
/// use rusqlite::Connection;
/// use sqlite_batch::prelude::*;
///
/// let conn = Connection::open_in_memory()?;
/// let request = BatchRequest::default()
///     .push("CREATE TABLE t (x)", vec![])
///     .push("INSERT INTO t VALUES (?)", vec![BindValue::Numeric(1.0)])
///     .push("SELECT * FROM t", vec![]);
/// let response = execute_batch(&conn, &request)?;
/// assert_eq!(response.len(), 3);
/// # Ok::<(), BatchError>(())
/// ```
///
/// # Errors
///
/// Returns `BatchError` only for failures that are not a statement's own outcome; in that case
/// no partial response is returned.
pub fn execute_batch(conn: &Connection, request: &BatchRequest) -> Result<BatchResponse, BatchError> {
    let mut emitter = UnboundedEmitter::with_capacity(request.len());
    for (index, entry) in request.entries.iter().enumerate() {
        emitter.push(run_entry(conn, index, entry)?);
    }
    Ok(emitter.finish())
}

/// Execute `request` lazily, yielding size-bounded messages.
///
/// Statements run only when the iterator needs more messages. The last message yielded has
/// `more_follows == false`.
#[must_use]
pub fn stream_batch<'a>(
    conn: &'a Connection,
    request: &'a BatchRequest,
    rough_cutoff_size: usize,
) -> BatchMessages<'a> {
    BatchMessages {
        conn,
        entries: request.entries.iter().enumerate(),
        emitter: BoundedEmitter::new(request.len(), rough_cutoff_size),
        failed: false,
    }
}

/// Lazy, finite message sequence of one bounded batch. Returned by [`stream_batch`].
///
/// After an `Err` item the iterator ends; messages already yielded must then be discarded.
pub struct BatchMessages<'a> {
    conn: &'a Connection,
    entries: std::iter::Enumerate<slice::Iter<'a, StatementEntry>>,
    emitter: BoundedEmitter,
    failed: bool,
}

impl BatchMessages<'_> {
    fn advance(&mut self) -> Result<bool, BatchError> {
        match self.entries.next() {
            Some((index, entry)) => {
                let result = run_entry(self.conn, index, entry)?;
                self.emitter.push(&result)?;
                Ok(true)
            }
            None => {
                self.emitter.finish();
                Ok(false)
            }
        }
    }
}

impl Iterator for BatchMessages<'_> {
    type Item = Result<OutboundMessage, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.emitter.pop() {
                return Some(Ok(message));
            }
            if self.failed || self.emitter.is_finished() {
                return None;
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => return self.emitter.pop().map(Ok),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl FusedIterator for BatchMessages<'_> {}
