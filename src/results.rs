pub mod entry;
pub mod message;

pub use entry::{
    BatchResponse, CommandResult, EntryResult, ErrorResult, RowsResult, STATUS_ERROR, STATUS_OK,
};
pub use message::{MessageKind, OutboundMessage};
