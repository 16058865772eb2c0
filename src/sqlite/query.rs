use rusqlite::Row;
use rusqlite::types::ValueRef;

use crate::types::CellValue;

/// Map one stored value to a cell.
///
/// Integer and real storage both become doubles; text and blob use the engine's text
/// rendering.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_from_value_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Double(i as f64),
        ValueRef::Real(f) => CellValue::Double(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Extract `column_count` cells from the current row, in column order.
///
/// # Errors
///
/// Returns `rusqlite::Error` if a column index is out of range for the row.
pub fn extract_row(row: &Row<'_>, column_count: usize) -> Result<Vec<CellValue>, rusqlite::Error> {
    let mut cells = Vec::with_capacity(column_count);
    for idx in 0..column_count {
        cells.push(cell_from_value_ref(row.get_ref(idx)?));
    }
    Ok(cells)
}
