//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::error::BatchError;
pub use crate::executor::{BatchMessages, execute_batch, stream_batch};
pub use crate::results::{BatchResponse, EntryResult, MessageKind, OutboundMessage};
pub use crate::sqlite::{BatchConnection, BatchOptions, BatchOptionsBuilder};
pub use crate::stream::DEFAULT_ROUGH_CUTOFF_SIZE;
pub use crate::types::{BatchRequest, BindValue, CellValue, StatementEntry};
