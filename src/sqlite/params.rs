use rusqlite::Statement;
use rusqlite::types::Null;

use crate::types::BindValue;

/// Bind one value at a 1-based parameter index.
///
/// Numeric values always bind as doubles. Text binds with its explicit length, so embedded
/// NUL characters are preserved.
///
/// # Errors
///
/// Returns the engine's `rusqlite::Error` when the bind is rejected (for example an index past
/// the statement's parameter count).
pub fn bind_value(
    stmt: &mut Statement<'_>,
    index: usize,
    value: &BindValue,
) -> Result<(), rusqlite::Error> {
    match value {
        BindValue::Numeric(n) => stmt.raw_bind_parameter(index, *n),
        BindValue::Text(s) => stmt.raw_bind_parameter(index, s.as_str()),
        BindValue::Null => stmt.raw_bind_parameter(index, Null),
    }
}

/// Bind all values left to right, stopping at the first failure.
///
/// # Errors
///
/// Returns the first bind error; values after it are not bound.
pub fn bind_all(stmt: &mut Statement<'_>, binds: &[BindValue]) -> Result<(), rusqlite::Error> {
    for (position, value) in binds.iter().enumerate() {
        bind_value(stmt, position + 1, value)?;
    }
    Ok(())
}
