//! Prepared statements, bound statements and result rows.

use crate::consistency::ConsistencyLevel;
use std::sync::Arc;
use uuid::Uuid;

/// A driver-level CQL value.
///
/// Field codecs live outside the mapper; callers hand the session values
/// already converted to this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// Absent value.
    Null,
    /// UTF-8 string.
    Text(String),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 32-bit signed integer.
    Int(i32),
    /// Boolean.
    Boolean(bool),
    /// 64-bit IEEE float.
    Double(f64),
    /// Arbitrary bytes.
    Blob(Vec<u8>),
    /// UUID.
    Uuid(Uuid),
    /// Millisecond timestamp.
    Timestamp(i64),
    /// Counter delta or value.
    Counter(i64),
}

/// A statement prepared against the cluster.
///
/// The id identifies the server-side prepared statement; the text is kept
/// for diagnostics and template equivalence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    /// Server-assigned statement identifier.
    pub id: Uuid,
    /// The CQL text the statement was prepared from.
    pub cql: String,
}

impl PreparedStatement {
    /// Creates a prepared statement handle.
    #[must_use]
    pub fn new(id: Uuid, cql: impl Into<String>) -> Self {
        Self {
            id,
            cql: cql.into(),
        }
    }
}

/// A prepared statement bound with values and execution options.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    /// The prepared statement template.
    pub prepared: Arc<PreparedStatement>,
    /// Positional values, one per bind marker.
    pub values: Vec<CqlValue>,
    /// Consistency level for this execution.
    pub consistency: ConsistencyLevel,
    /// Serial consistency, for conditional writes only.
    pub serial_consistency: Option<ConsistencyLevel>,
}

impl BoundStatement {
    /// Binds values to a prepared statement.
    #[must_use]
    pub fn new(
        prepared: Arc<PreparedStatement>,
        values: Vec<CqlValue>,
        consistency: ConsistencyLevel,
    ) -> Self {
        Self {
            prepared,
            values,
            consistency,
            serial_consistency: None,
        }
    }

    /// Sets the serial consistency level.
    #[must_use]
    pub fn with_serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }
}

/// One result row: named column values in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, CqlValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named column value.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: CqlValue) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Looks up a column value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the columns in projection order.
    #[must_use]
    pub fn columns(&self) -> &[(String, CqlValue)] {
        &self.columns
    }
}
