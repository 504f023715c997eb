//! Entity descriptors: the declared shape of a mapped type.
//!
//! Rust has no runtime class scanning, so the entity marker is the
//! [`Entity`] trait: a mapped type describes itself through a plain-data
//! [`EntityDescriptor`], typically written by hand or emitted by a derive
//! macro. Descriptors are the input to the parsing pipeline; the parser
//! turns them into validated [`crate::meta::EntityMeta`].

use crate::meta::{ColumnRole, ComputedSpec, InsertStrategy, SortOrder};
use entimap_session::{ConsistencyLevel, CqlType};
use std::any::TypeId;

/// Marker trait for mapped entity types.
pub trait Entity: 'static {
    /// Returns the declared shape of this entity.
    fn descriptor() -> EntityDescriptor;
}

/// Returns the unqualified name of a type.
pub(crate) fn short_type_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Whether a descriptor targets a table or a materialized view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A regular table.
    Table,
    /// A materialized view derived from a base entity.
    View {
        /// The base entity type.
        base: TypeId,
        /// The base entity's unqualified type name, for diagnostics.
        base_name: &'static str,
    },
}

/// The declared shape of one mapped type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// The mapped type.
    pub type_id: TypeId,
    /// Unqualified type name, for diagnostics.
    pub type_name: &'static str,
    /// Module path of the mapped type, matched against namespace roots.
    pub module_path: &'static str,
    /// Keyspace override; falls back to the configured default keyspace.
    pub keyspace: Option<&'static str>,
    /// Table or view name.
    pub target_name: &'static str,
    /// Table or view target.
    pub kind: TargetKind,
    /// Declared properties.
    pub properties: Vec<PropertyDescriptor>,
    /// Per-entity default read consistency.
    pub read_consistency: Option<ConsistencyLevel>,
    /// Per-entity default write consistency.
    pub write_consistency: Option<ConsistencyLevel>,
    /// Per-entity default serial consistency.
    pub serial_consistency: Option<ConsistencyLevel>,
    /// Insert strategy for this entity.
    pub insert_strategy: InsertStrategy,
}

impl EntityDescriptor {
    /// Describes a table-backed entity.
    ///
    /// `module_path` is the defining module's `module_path!()`.
    #[must_use]
    pub fn table<T: 'static>(target_name: &'static str, module_path: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            module_path,
            keyspace: None,
            target_name,
            kind: TargetKind::Table,
            properties: Vec::new(),
            read_consistency: None,
            write_consistency: None,
            serial_consistency: None,
            insert_strategy: InsertStrategy::default(),
        }
    }

    /// Describes a materialized-view entity derived from base entity `B`.
    #[must_use]
    pub fn view<T: 'static, B: 'static>(
        target_name: &'static str,
        module_path: &'static str,
    ) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            module_path,
            keyspace: None,
            target_name,
            kind: TargetKind::View {
                base: TypeId::of::<B>(),
                base_name: short_type_name::<B>(),
            },
            properties: Vec::new(),
            read_consistency: None,
            write_consistency: None,
            serial_consistency: None,
            insert_strategy: InsertStrategy::default(),
        }
    }

    /// Sets the keyspace.
    #[must_use]
    pub fn in_keyspace(mut self, keyspace: &'static str) -> Self {
        self.keyspace = Some(keyspace);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Sets the per-entity default read consistency.
    #[must_use]
    pub fn read_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = Some(level);
        self
    }

    /// Sets the per-entity default write consistency.
    #[must_use]
    pub fn write_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.write_consistency = Some(level);
        self
    }

    /// Sets the per-entity default serial consistency.
    #[must_use]
    pub fn serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }

    /// Sets the insert strategy.
    #[must_use]
    pub fn insert_strategy(mut self, strategy: InsertStrategy) -> Self {
        self.insert_strategy = strategy;
        self
    }
}

/// The declared shape of one mapped property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Column name.
    pub name: &'static str,
    /// Declared CQL type.
    pub cql_type: CqlType,
    /// Column role.
    pub role: ColumnRole,
    /// Zero-based ordinal among keys of the same role.
    pub key_index: Option<usize>,
    /// Clustering sort direction.
    pub clustering_order: SortOrder,
    /// Per-property read consistency override.
    pub read_consistency: Option<ConsistencyLevel>,
    /// Per-property write consistency override.
    pub write_consistency: Option<ConsistencyLevel>,
    /// Computed projection spec, for computed columns.
    pub computed: Option<ComputedSpec>,
    /// Join target, for join-valued properties.
    pub join_target: Option<JoinTarget>,
}

/// A declared reference to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTarget {
    /// The referenced entity type.
    pub type_id: TypeId,
    /// The referenced entity's unqualified type name, for diagnostics.
    pub type_name: &'static str,
}

impl PropertyDescriptor {
    fn new(name: &'static str, cql_type: CqlType, role: ColumnRole) -> Self {
        Self {
            name,
            cql_type,
            role,
            key_index: None,
            clustering_order: SortOrder::default(),
            read_consistency: None,
            write_consistency: None,
            computed: None,
            join_target: None,
        }
    }

    /// Declares a partition-key column with its zero-based ordinal.
    #[must_use]
    pub fn partition_key(name: &'static str, cql_type: CqlType, index: usize) -> Self {
        let mut property = Self::new(name, cql_type, ColumnRole::PartitionKey);
        property.key_index = Some(index);
        property
    }

    /// Declares a clustering-key column with its zero-based ordinal.
    #[must_use]
    pub fn clustering_key(name: &'static str, cql_type: CqlType, index: usize) -> Self {
        let mut property = Self::new(name, cql_type, ColumnRole::ClusteringKey);
        property.key_index = Some(index);
        property
    }

    /// Declares a regular data column.
    #[must_use]
    pub fn regular(name: &'static str, cql_type: CqlType) -> Self {
        Self::new(name, cql_type, ColumnRole::Regular)
    }

    /// Declares a static column.
    #[must_use]
    pub fn static_column(name: &'static str, cql_type: CqlType) -> Self {
        Self::new(name, cql_type, ColumnRole::Static)
    }

    /// Declares a counter column.
    #[must_use]
    pub fn counter(name: &'static str) -> Self {
        Self::new(name, CqlType::Counter, ColumnRole::Counter)
    }

    /// Declares a computed SELECT projection.
    #[must_use]
    pub fn computed(
        name: &'static str,
        cql_type: CqlType,
        function: &'static str,
        targets: Vec<&'static str>,
    ) -> Self {
        let mut property = Self::new(name, cql_type, ColumnRole::Computed);
        property.computed = Some(ComputedSpec { function, targets });
        property
    }

    /// Declares a regular column holding a reference to entity `B`.
    #[must_use]
    pub fn join<B: 'static>(name: &'static str, cql_type: CqlType) -> Self {
        let mut property = Self::new(name, cql_type, ColumnRole::Regular);
        property.join_target = Some(JoinTarget {
            type_id: TypeId::of::<B>(),
            type_name: short_type_name::<B>(),
        });
        property
    }

    /// Sets descending clustering order.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.clustering_order = SortOrder::Descending;
        self
    }

    /// Sets the per-property read consistency override.
    #[must_use]
    pub fn with_read_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = Some(level);
        self
    }

    /// Sets the per-property write consistency override.
    #[must_use]
    pub fn with_write_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.write_consistency = Some(level);
        self
    }
}
