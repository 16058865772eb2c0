//! Execute a batch of SQL statements on one embedded `SQLite` connection.
//!
//! Each statement yields an error entry, a command summary, or a row set. Results are either
//! collected into one [`BatchResponse`] or, in bounded mode, delivered as a sequence of
//! messages that each stay under a rough byte cutoff.
//!
//! ```rust
//! use rusqlite::Connection;
//! use sqlite_batch::prelude::*;
//!
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE t (x)")?;
//!
//! let request = BatchRequest::default()
//!     .push("INSERT INTO t VALUES (?)", vec![BindValue::Numeric(1.0)])
//!     .push("SELECT * FROM t", vec![]);
//!
//! let response = execute_batch(&conn, &request)?;
//! let command = response.results[0].as_command().unwrap();
//! assert_eq!(command.rows_affected, 1);
//! let rows = response.results[1].as_rows().unwrap();
//! assert_eq!(rows.rows, vec![vec![CellValue::Double(1.0)]]);
//! # Ok::<(), BatchError>(())
//! ```

pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod sqlite;
pub mod stream;
pub mod types;

pub use error::BatchError;
pub use executor::{BatchMessages, execute_batch, stream_batch};
pub use results::{BatchResponse, EntryResult, MessageKind, OutboundMessage};
pub use sqlite::{BatchConnection, BatchOptions, BatchOptionsBuilder};
pub use stream::DEFAULT_ROUGH_CUTOFF_SIZE;
pub use types::{BatchRequest, BindValue, CellValue, StatementEntry};
