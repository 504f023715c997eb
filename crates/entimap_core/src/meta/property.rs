//! Per-property metadata.

use entimap_session::{ColumnKind, ConsistencyLevel, CqlType};
use std::fmt;

/// The role a mapped property plays in the target table or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Part of the partition key.
    PartitionKey,
    /// Part of the clustering key.
    ClusteringKey,
    /// Regular data column.
    Regular,
    /// Static column shared by all rows of a partition.
    Static,
    /// Computed projection, present only in SELECT statements.
    Computed,
    /// Distributed counter column.
    Counter,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PartitionKey => "partition key",
            Self::ClusteringKey => "clustering key",
            Self::Regular => "regular",
            Self::Static => "static",
            Self::Computed => "computed",
            Self::Counter => "counter",
        };
        f.write_str(name)
    }
}

/// In-partition sort direction of a clustering key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortOrder {
    /// Returns the CQL keyword for this direction.
    #[must_use]
    pub const fn cql_keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// How insert statements treat unset fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertStrategy {
    /// Bind every mapped column; unset fields become null tombstones.
    #[default]
    AllFields,
    /// Bind only non-null fields at execution time.
    NotNullFields,
}

/// A computed SELECT projection: `function(targets...) AS alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedSpec {
    /// The CQL function applied, e.g. `writetime` or `ttl`.
    pub function: &'static str,
    /// Columns the function is applied to.
    pub targets: Vec<&'static str>,
}

/// Metadata for one mapped property.
///
/// Owned exclusively by its entity's metadata; immutable after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMeta {
    name: &'static str,
    cql_type: CqlType,
    role: ColumnRole,
    clustering_order: SortOrder,
    read_consistency: Option<ConsistencyLevel>,
    write_consistency: Option<ConsistencyLevel>,
    computed: Option<ComputedSpec>,
}

impl PropertyMeta {
    /// Creates property metadata.
    #[must_use]
    pub fn new(
        name: &'static str,
        cql_type: CqlType,
        role: ColumnRole,
        clustering_order: SortOrder,
        read_consistency: Option<ConsistencyLevel>,
        write_consistency: Option<ConsistencyLevel>,
        computed: Option<ComputedSpec>,
    ) -> Self {
        Self {
            name,
            cql_type,
            role,
            clustering_order,
            read_consistency,
            write_consistency,
            computed,
        }
    }

    /// Returns the column name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared CQL type.
    #[must_use]
    pub const fn cql_type(&self) -> &CqlType {
        &self.cql_type
    }

    /// Returns the column role.
    #[must_use]
    pub const fn role(&self) -> ColumnRole {
        self.role
    }

    /// Returns the clustering sort direction.
    #[must_use]
    pub const fn clustering_order(&self) -> SortOrder {
        self.clustering_order
    }

    /// Returns the per-property read consistency override.
    #[must_use]
    pub const fn read_consistency(&self) -> Option<ConsistencyLevel> {
        self.read_consistency
    }

    /// Returns the per-property write consistency override.
    #[must_use]
    pub const fn write_consistency(&self) -> Option<ConsistencyLevel> {
        self.write_consistency
    }

    /// Returns the computed projection spec for computed columns.
    #[must_use]
    pub const fn computed(&self) -> Option<&ComputedSpec> {
        self.computed.as_ref()
    }

    /// Returns `true` if the property is part of the primary key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        matches!(self.role, ColumnRole::PartitionKey | ColumnRole::ClusteringKey)
    }

    /// Maps the role onto the live-metadata column kind.
    ///
    /// Computed columns have no live counterpart and return `None`.
    #[must_use]
    pub const fn column_kind(&self) -> Option<ColumnKind> {
        match self.role {
            ColumnRole::PartitionKey => Some(ColumnKind::PartitionKey),
            ColumnRole::ClusteringKey => Some(ColumnKind::Clustering),
            ColumnRole::Regular | ColumnRole::Counter => Some(ColumnKind::Regular),
            ColumnRole::Static => Some(ColumnKind::Static),
            ColumnRole::Computed => None,
        }
    }
}
