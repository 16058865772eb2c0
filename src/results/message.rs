/// What an outbound message carries, so a receiver can reassemble partial row sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// JSON array of complete entry results
    Results,
    /// `{"status":0,"partial":1,"columns":[...],"rowsLength":n}`, followed by `n` row messages
    PartialHeader,
    /// JSON array holding the cells of one row of the preceding partial header
    Row,
}

/// One size-bounded message of a streamed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub kind: MessageKind,
    /// JSON text of the message body
    pub payload: String,
    /// Cleared only on the last message of the batch.
    pub more_follows: bool,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(kind: MessageKind, payload: String, more_follows: bool) -> Self {
        Self {
            kind,
            payload,
            more_follows,
        }
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.more_follows
    }

    /// Parse the payload back into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload is not valid JSON.
    pub fn payload_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}
