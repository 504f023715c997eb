//! Live schema metadata snapshots and structured DDL.
//!
//! These types describe what the cluster reports about a keyspace at a
//! point in time. The mapper core validates its declared entity metadata
//! against these snapshots and never holds live driver handles.

use std::collections::HashMap;
use std::fmt;

/// A CQL column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlType {
    /// US-ASCII string.
    Ascii,
    /// 64-bit signed integer.
    BigInt,
    /// Arbitrary bytes.
    Blob,
    /// Boolean.
    Boolean,
    /// Distributed counter.
    Counter,
    /// Calendar date without time.
    Date,
    /// Arbitrary-precision decimal.
    Decimal,
    /// 64-bit IEEE float.
    Double,
    /// 32-bit IEEE float.
    Float,
    /// IP address.
    Inet,
    /// 32-bit signed integer.
    Int,
    /// 16-bit signed integer.
    SmallInt,
    /// UTF-8 string.
    Text,
    /// Time of day.
    Time,
    /// Millisecond timestamp.
    Timestamp,
    /// Version-1 UUID.
    TimeUuid,
    /// 8-bit signed integer.
    TinyInt,
    /// UUID.
    Uuid,
    /// Arbitrary-precision integer.
    VarInt,
    /// Ordered collection of one element type.
    List(Box<CqlType>),
    /// Unordered collection of unique elements.
    Set(Box<CqlType>),
    /// Key/value collection.
    Map(Box<CqlType>, Box<CqlType>),
}

impl CqlType {
    /// Returns the CQL spelling of this type, as used in DDL.
    #[must_use]
    pub fn cql_name(&self) -> String {
        match self {
            Self::Ascii => "ascii".into(),
            Self::BigInt => "bigint".into(),
            Self::Blob => "blob".into(),
            Self::Boolean => "boolean".into(),
            Self::Counter => "counter".into(),
            Self::Date => "date".into(),
            Self::Decimal => "decimal".into(),
            Self::Double => "double".into(),
            Self::Float => "float".into(),
            Self::Inet => "inet".into(),
            Self::Int => "int".into(),
            Self::SmallInt => "smallint".into(),
            Self::Text => "text".into(),
            Self::Time => "time".into(),
            Self::Timestamp => "timestamp".into(),
            Self::TimeUuid => "timeuuid".into(),
            Self::TinyInt => "tinyint".into(),
            Self::Uuid => "uuid".into(),
            Self::VarInt => "varint".into(),
            Self::List(inner) => format!("list<{}>", inner.cql_name()),
            Self::Set(inner) => format!("set<{}>", inner.cql_name()),
            Self::Map(k, v) => format!("map<{}, {}>", k.cql_name(), v.cql_name()),
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql_name())
    }
}

/// The structural role of a column within a table or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Part of the partition key.
    PartitionKey,
    /// Part of the clustering key.
    Clustering,
    /// Regular data column.
    Regular,
    /// Static column shared by a partition.
    Static,
}

/// Metadata for one column of a live table or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Declared CQL type.
    pub cql_type: CqlType,
    /// Structural role.
    pub kind: ColumnKind,
}

impl ColumnMetadata {
    /// Creates column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, cql_type: CqlType, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            cql_type,
            kind,
        }
    }
}

/// Snapshot of a live table's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Owning keyspace.
    pub keyspace: String,
    /// Table name.
    pub name: String,
    /// Columns in cluster-reported order.
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Creates table metadata.
    #[must_use]
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Snapshot of a live materialized view's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMetadata {
    /// Owning keyspace.
    pub keyspace: String,
    /// View name.
    pub name: String,
    /// Name of the base table this view is derived from.
    pub base_table: String,
    /// Columns in cluster-reported order.
    pub columns: Vec<ColumnMetadata>,
}

impl ViewMetadata {
    /// Creates view metadata.
    #[must_use]
    pub fn new(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        base_table: impl Into<String>,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            base_table: base_table.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Snapshot of a live keyspace: its tables and materialized views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyspaceMetadata {
    /// Keyspace name.
    pub name: String,
    /// Tables by name.
    pub tables: HashMap<String, TableMetadata>,
    /// Materialized views by name.
    pub views: HashMap<String, ViewMetadata>,
}

impl KeyspaceMetadata {
    /// Creates an empty keyspace snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: HashMap::new(),
            views: HashMap::new(),
        }
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Adds a materialized view.
    #[must_use]
    pub fn with_view(mut self, view: ViewMetadata) -> Self {
        self.views.insert(view.name.clone(), view);
        self
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(name)
    }

    /// Looks up a materialized view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&ViewMetadata> {
        self.views.get(name)
    }
}

/// The schema object a DDL statement creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    /// A table.
    Table(TableMetadata),
    /// A materialized view.
    View(ViewMetadata),
}

impl SchemaObject {
    /// Returns the keyspace-qualified name of the object.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self {
            Self::Table(t) => format!("{}.{}", t.keyspace, t.name),
            Self::View(v) => format!("{}.{}", v.keyspace, v.name),
        }
    }
}

/// A structured DDL statement.
///
/// Carries both the rendered CQL text and the metadata image of the object
/// the text creates. Live sessions execute `cql`; test sessions apply
/// `object` to their catalog directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDdl {
    /// Rendered CQL `CREATE ...` text.
    pub cql: String,
    /// Metadata image of the created object.
    pub object: SchemaObject,
}
