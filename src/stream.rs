//! Output side of a batch: collecting entry results or turning them into size-bounded
//! messages.
//!
//! [`UnboundedEmitter`] keeps every entry and hands back one [`BatchResponse`]. It suits
//! transports with no practical message ceiling.
//!
//! [`BoundedEmitter`] keeps a rough byte estimate of everything buffered. Small entries are
//! flushed together once the whole batch has been seen. A row set that would push the buffer
//! past the cutoff is sent as a partial header followed by one message per row:
//!
//! ```text
//! [{"status":0,"totalChanges":1,...}]                          more_follows = true
//! {"status":0,"partial":1,"columns":["x"],"rowsLength":2}      more_follows = true
//! [1.0]                                                         more_follows = true
//! [2.0]                                                         more_follows = false
//! ```

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::BatchError;
use crate::results::{BatchResponse, EntryResult, MessageKind, OutboundMessage, STATUS_OK};

/// Conservative default rough cutoff for one outbound message (5 MB).
pub const DEFAULT_ROUGH_CUTOFF_SIZE: usize = 5 * 1000 * 1000;

/// Accumulates every entry in order.
#[derive(Debug, Default)]
pub struct UnboundedEmitter {
    response: BatchResponse,
}

impl UnboundedEmitter {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            response: BatchResponse::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: EntryResult) {
        self.response.push(entry);
    }

    #[must_use]
    pub fn finish(self) -> BatchResponse {
        self.response
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PartialHeader<'a> {
    status: i32,
    partial: i32,
    columns: &'a [String],
    rows_length: usize,
}

/// Turns entry results into messages whose rough size stays below a cutoff.
///
/// Finished messages queue up inside the emitter until taken with [`BoundedEmitter::pop`].
#[derive(Debug)]
pub struct BoundedEmitter {
    rough_cutoff_size: usize,
    total_count: usize,
    result_count: usize,
    buffered: Vec<String>,
    buffered_rough_size: usize,
    pending: VecDeque<OutboundMessage>,
    finished: bool,
}

impl BoundedEmitter {
    /// `total_count` is the number of entries in the batch; the final flush happens when that
    /// many entries have been pushed.
    #[must_use]
    pub fn new(total_count: usize, rough_cutoff_size: usize) -> Self {
        Self {
            rough_cutoff_size,
            total_count,
            result_count: 0,
            buffered: Vec::new(),
            buffered_rough_size: 0,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Rough byte size of the entries buffered but not yet flushed.
    #[must_use]
    pub fn buffered_rough_size(&self) -> usize {
        self.buffered_rough_size
    }

    /// Whether the terminal message has been queued.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Take the next finished message, if any.
    pub fn pop(&mut self) -> Option<OutboundMessage> {
        self.pending.pop_front()
    }

    /// Feed the next entry of the batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Other` if more entries are pushed than the declared batch size, or
    /// `BatchError::SerializationError` if an entry cannot be encoded.
    pub fn push(&mut self, entry: &EntryResult) -> Result<(), BatchError> {
        if self.result_count >= self.total_count {
            return Err(BatchError::Other(format!(
                "bounded emitter received more than {} entries",
                self.total_count
            )));
        }

        match entry {
            EntryResult::Rows(rows) => self.push_rows(&rows.columns, &rows.rows),
            _ => {
                let json = entry.to_json_string()?;
                self.push_encoded(json);
                Ok(())
            }
        }
    }

    /// Queue the terminal message for an empty batch; a no-op otherwise.
    pub fn finish(&mut self) {
        if !self.finished && self.total_count == 0 {
            self.flush();
        }
    }

    fn push_rows<T: Serialize>(&mut self, columns: &[String], rows: &[T]) -> Result<(), BatchError> {
        let mut encoded_rows = Vec::with_capacity(rows.len());
        let mut rows_rough_size = 0;
        for row in rows {
            let json = serde_json::to_string(row)?;
            rows_rough_size += json.len();
            encoded_rows.push(json);
        }

        // a partial header must be followed by at least one row message
        if rows.is_empty() || self.buffered_rough_size + rows_rough_size < self.rough_cutoff_size {
            let json = format!(
                "{{\"status\":{STATUS_OK},\"columns\":{},\"rows\":[{}]}}",
                serde_json::to_string(columns)?,
                encoded_rows.join(",")
            );
            self.push_encoded(json);
            return Ok(());
        }

        if !self.buffered.is_empty() {
            self.flush();
        }

        let rows_length = encoded_rows.len();
        self.result_count += 1;
        let last_entry = self.result_count == self.total_count;

        let header = serde_json::to_string(&PartialHeader {
            status: STATUS_OK,
            partial: 1,
            columns,
            rows_length,
        })?;
        tracing::debug!(
            rows_length,
            rows_rough_size,
            "row set exceeds rough cutoff, sending row by row"
        );
        self.enqueue(MessageKind::PartialHeader, header, true);

        for (i, json) in encoded_rows.into_iter().enumerate() {
            let last_row = i + 1 == rows_length;
            self.enqueue(MessageKind::Row, json, !(last_entry && last_row));
        }

        Ok(())
    }

    fn push_encoded(&mut self, json: String) {
        self.buffered_rough_size += json.len();
        self.buffered.push(json);
        self.result_count += 1;
        if self.result_count == self.total_count {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let count = self.buffered.len();
        let payload = format!("[{}]", self.buffered.join(","));
        tracing::debug!(
            count,
            rough_size = self.buffered_rough_size,
            "flushing buffered results"
        );
        let more_follows = self.result_count != self.total_count;
        self.enqueue(MessageKind::Results, payload, more_follows);
        self.buffered.clear();
        self.buffered_rough_size = 0;
    }

    fn enqueue(&mut self, kind: MessageKind, payload: String, more_follows: bool) {
        if !more_follows {
            self.finished = true;
        }
        self.pending
            .push_back(OutboundMessage::new(kind, payload, more_follows));
    }
}
