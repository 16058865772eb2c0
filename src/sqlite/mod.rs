// SQLite module - the engine-facing half of batch execution
//
// - config: Connection options and opening
// - params: Bind coercion of `BindValue`s onto a prepared statement
// - query: Cell extraction from stepped rows
// - runner: Driving one statement to a classified outcome
// - worker: Connection owned by a dedicated thread, driven from async code

pub mod config;
pub mod params;
pub mod query;
pub mod runner;
pub mod worker;

pub use config::{BatchOptions, BatchOptionsBuilder};
pub use runner::{StatementOutcome, run_statement};
pub use worker::{BatchConnection, MessageReceiver};
