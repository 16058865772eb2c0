use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::BatchError;
use crate::sqlite::runner::StatementOutcome;
use crate::types::CellValue;

/// `SQLITE_OK`
pub const STATUS_OK: i32 = 0;
/// `SQLITE_ERROR`; the only failure status an entry ever carries.
pub const STATUS_ERROR: i32 = 1;

/// The result of one statement in a batch.
///
/// Field order is part of the wire format and follows declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryResult {
    Error(ErrorResult),
    Command(CommandResult),
    Rows(RowsResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub status: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub status: i32,
    pub total_changes: i64,
    pub rows_affected: i64,
    pub last_insert_row_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowsResult {
    pub status: i32,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl EntryResult {
    /// Encode a statement outcome.
    #[must_use]
    pub fn from_outcome(outcome: StatementOutcome) -> Self {
        match outcome {
            StatementOutcome::Failed { message } => EntryResult::Error(ErrorResult {
                status: STATUS_ERROR,
                message,
            }),
            StatementOutcome::Command {
                total_changes,
                rows_affected,
                last_insert_rowid,
            } => EntryResult::Command(CommandResult {
                status: STATUS_OK,
                total_changes,
                rows_affected,
                last_insert_row_id: last_insert_rowid,
            }),
            StatementOutcome::Rows { columns, rows } => EntryResult::Rows(RowsResult {
                status: STATUS_OK,
                columns,
                rows,
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> i32 {
        match self {
            EntryResult::Error(e) => e.status,
            EntryResult::Command(c) => c.status,
            EntryResult::Rows(r) => r.status,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status() != STATUS_OK
    }

    #[must_use]
    pub fn as_error(&self) -> Option<&ErrorResult> {
        if let EntryResult::Error(e) = self {
            Some(e)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_command(&self) -> Option<&CommandResult> {
        if let EntryResult::Command(c) = self {
            Some(c)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_rows(&self) -> Option<&RowsResult> {
        if let EntryResult::Rows(r) = self {
            Some(r)
        } else {
            None
        }
    }

    /// Encode as JSON text.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::SerializationError` if encoding fails.
    pub fn to_json_string(&self) -> Result<String, BatchError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<StatementOutcome> for EntryResult {
    fn from(outcome: StatementOutcome) -> Self {
        Self::from_outcome(outcome)
    }
}

/// Complete, order-preserving response of an unbounded batch call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResponse {
    pub results: Vec<EntryResult>,
}

impl BatchResponse {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: EntryResult) {
        self.results.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Encode as a JSON array, one object per entry.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::SerializationError` if encoding fails.
    pub fn to_json(&self) -> Result<JsonValue, BatchError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl IntoIterator for BatchResponse {
    type Item = EntryResult;
    type IntoIter = std::vec::IntoIter<EntryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
