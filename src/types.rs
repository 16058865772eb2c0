use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::BatchError;

/// A parameter value substituted into a prepared statement.
///
/// Loosely-typed input is classified into this closed set once, at the request boundary:
/// ```rust
/// use serde_json::json;
/// use sqlite_batch::prelude::*;
///
/// assert_eq!(BindValue::from(&json!(3)), BindValue::Numeric(3.0));
/// assert_eq!(BindValue::from(&json!("abc")), BindValue::Text("abc".into()));
/// assert_eq!(BindValue::from(&json!(true)), BindValue::Null);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// Numeric value, always bound as a double
    Numeric(f64),
    /// Text value, bound with an explicit length
    Text(String),
    /// SQL NULL
    Null,
}

impl BindValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&JsonValue> for BindValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            // as_f64 only fails for arbitrary-precision numbers that do not fit
            JsonValue::Number(n) => n.as_f64().map_or(BindValue::Null, BindValue::Numeric),
            JsonValue::String(s) => BindValue::Text(s.clone()),
            _ => BindValue::Null,
        }
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        BindValue::Numeric(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        BindValue::Numeric(f64::from(value))
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_owned())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}

/// A single cell of a result row.
///
/// Integer and floating storage both arrive as [`CellValue::Double`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Double(f64),
    Text(String),
    Null,
}

impl CellValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        if let CellValue::Double(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let CellValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

/// One SQL statement with its positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

impl StatementEntry {
    #[must_use]
    pub fn with_binds(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }
}

impl TryFrom<&JsonValue> for StatementEntry {
    type Error = BatchError;

    /// Accepts `[sql, [bind, ...]]`. The bind list is required, even when empty.
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        let parts = value.as_array().ok_or_else(|| {
            BatchError::MalformedRequest(format!("entry is not an array: {value}"))
        })?;

        let sql = parts
            .first()
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                BatchError::MalformedRequest(format!("entry has no SQL string: {value}"))
            })?;

        let binds = match parts.get(1) {
            Some(JsonValue::Array(values)) => values.iter().map(BindValue::from).collect(),
            None => {
                return Err(BatchError::MalformedRequest(format!(
                    "entry has no bind list: {value}"
                )));
            }
            Some(other) => {
                return Err(BatchError::MalformedRequest(format!(
                    "bind list is not an array: {other}"
                )));
            }
        };

        Ok(StatementEntry::with_binds(sql, binds))
    }
}

/// Ordered list of statements executed as one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequest {
    pub entries: Vec<StatementEntry>,
}

impl BatchRequest {
    /// Builder-style append of one statement.
    #[must_use]
    pub fn push(mut self, sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        self.entries.push(StatementEntry::with_binds(sql, binds));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a host-supplied JSON request of the form `[[sql, [binds...]], ...]`.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::MalformedRequest` if the value is not an array of entries or any
    /// entry cannot be classified.
    pub fn from_json(value: &JsonValue) -> Result<Self, BatchError> {
        let entries = value.as_array().ok_or_else(|| {
            BatchError::MalformedRequest("batch request is not an array".to_string())
        })?;

        let entries = entries
            .iter()
            .map(StatementEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }
}

impl From<Vec<StatementEntry>> for BatchRequest {
    fn from(entries: Vec<StatementEntry>) -> Self {
        Self { entries }
    }
}
