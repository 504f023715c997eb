//! Per-entity metadata.

use crate::consistency::{self, ConsistencyPolicy};
use crate::error::{MapperError, MapperResult};
use crate::interceptor::{Event, Interceptor};
use crate::meta::kind::EntityKind;
use crate::meta::property::{ColumnRole, InsertStrategy, PropertyMeta};
use entimap_session::ConsistencyLevel;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A resolved join-valued property.
///
/// Holds the target entity's type and table name; the target's full
/// metadata is reachable through the frozen registry, so no owning
/// reference is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMeta {
    pub(crate) property: &'static str,
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) target_table: String,
}

impl JoinMeta {
    /// Returns the join property's column name.
    #[must_use]
    pub const fn property(&self) -> &'static str {
        self.property
    }

    /// Returns the target entity type.
    #[must_use]
    pub const fn target(&self) -> TypeId {
        self.target
    }

    /// Returns the target entity's unqualified type name.
    #[must_use]
    pub const fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Returns the target entity's table name, resolved in the second
    /// parsing pass.
    #[must_use]
    pub fn target_table(&self) -> &str {
        &self.target_table
    }
}

/// Immutable-after-build snapshot of one entity's shape.
///
/// Built by the parser during bootstrap and frozen into the registry;
/// read-only afterwards. Key columns keep their declared order, which is
/// a correctness requirement for clustering semantics.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) keyspace: String,
    pub(crate) target_name: &'static str,
    pub(crate) kind: EntityKind,
    pub(crate) partition_keys: Vec<PropertyMeta>,
    pub(crate) clustering_keys: Vec<PropertyMeta>,
    pub(crate) static_columns: Vec<PropertyMeta>,
    pub(crate) regular_columns: Vec<PropertyMeta>,
    pub(crate) computed_columns: Vec<PropertyMeta>,
    pub(crate) counter_columns: Vec<PropertyMeta>,
    pub(crate) joins: Vec<JoinMeta>,
    pub(crate) read_consistency: Option<ConsistencyLevel>,
    pub(crate) write_consistency: Option<ConsistencyLevel>,
    pub(crate) serial_consistency: Option<ConsistencyLevel>,
    pub(crate) insert_strategy: InsertStrategy,
}

impl EntityMeta {
    /// Returns the mapped type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the mapped type's unqualified name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the keyspace.
    #[must_use]
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Returns the table or view name.
    #[must_use]
    pub const fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Returns the keyspace-qualified table or view name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.target_name)
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Returns `true` for table-backed entities.
    #[must_use]
    pub const fn is_table(&self) -> bool {
        self.kind.is_table()
    }

    /// Returns `true` for view-backed entities.
    #[must_use]
    pub const fn is_view(&self) -> bool {
        self.kind.is_view()
    }

    /// Returns `true` if this entity accepts mutations.
    #[must_use]
    pub const fn supports_mutation(&self) -> bool {
        self.kind.supports_mutation()
    }

    /// Returns `true` if the entity carries counter columns.
    #[must_use]
    pub fn is_counter_table(&self) -> bool {
        !self.counter_columns.is_empty()
    }

    /// Returns `true` if the entity carries static columns.
    #[must_use]
    pub fn has_static_columns(&self) -> bool {
        !self.static_columns.is_empty()
    }

    /// Returns the partition-key properties in declared order.
    #[must_use]
    pub fn partition_keys(&self) -> &[PropertyMeta] {
        &self.partition_keys
    }

    /// Returns the clustering-key properties in declared order.
    #[must_use]
    pub fn clustering_keys(&self) -> &[PropertyMeta] {
        &self.clustering_keys
    }

    /// Returns the static columns.
    #[must_use]
    pub fn static_columns(&self) -> &[PropertyMeta] {
        &self.static_columns
    }

    /// Returns the regular data columns.
    #[must_use]
    pub fn regular_columns(&self) -> &[PropertyMeta] {
        &self.regular_columns
    }

    /// Returns the computed SELECT projections.
    #[must_use]
    pub fn computed_columns(&self) -> &[PropertyMeta] {
        &self.computed_columns
    }

    /// Returns the counter columns.
    #[must_use]
    pub fn counter_columns(&self) -> &[PropertyMeta] {
        &self.counter_columns
    }

    /// Returns the resolved join properties.
    #[must_use]
    pub fn joins(&self) -> &[JoinMeta] {
        &self.joins
    }

    /// Returns the stored columns in the fixed order: partition keys,
    /// clustering keys, static columns, regular columns, counter columns.
    ///
    /// Computed projections are excluded; they exist only in SELECT
    /// statements.
    #[must_use]
    pub fn all_columns(&self) -> Vec<&PropertyMeta> {
        self.partition_keys
            .iter()
            .chain(&self.clustering_keys)
            .chain(&self.static_columns)
            .chain(&self.regular_columns)
            .chain(&self.counter_columns)
            .collect()
    }

    /// Returns the primary-key columns: partition keys then clustering
    /// keys, each in declared order.
    #[must_use]
    pub fn key_columns(&self) -> Vec<&PropertyMeta> {
        self.partition_keys.iter().chain(&self.clustering_keys).collect()
    }

    /// Looks up a property by column name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.all_columns()
            .into_iter()
            .chain(&self.computed_columns)
            .find(|p| p.name() == name)
    }

    /// For views, returns the base entity type and its table name.
    #[must_use]
    pub fn view_base(&self) -> Option<(TypeId, &str)> {
        match &self.kind {
            EntityKind::View {
                base, base_table, ..
            } => Some((*base, base_table.as_str())),
            EntityKind::Table => None,
        }
    }

    /// Returns the insert strategy.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views: a materialized
    /// view cannot be written through the mapper.
    pub fn insert_strategy(&self) -> MapperResult<InsertStrategy> {
        if self.is_view() {
            return Err(self.view_mutation_error("insert strategy"));
        }
        Ok(self.insert_strategy)
    }

    /// Resolves the read consistency for an operation.
    ///
    /// Precedence: runtime override, per-property default, per-entity
    /// default, global policy default.
    #[must_use]
    pub fn read_consistency(
        &self,
        runtime: Option<ConsistencyLevel>,
        property: Option<&PropertyMeta>,
        policy: &ConsistencyPolicy,
    ) -> ConsistencyLevel {
        consistency::resolve(
            runtime,
            property.and_then(PropertyMeta::read_consistency),
            self.read_consistency,
            policy.read,
        )
    }

    /// Resolves the write consistency for a mutation.
    ///
    /// Counter tables fall back to the policy's counter-write default when
    /// one is configured.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views.
    pub fn write_consistency(
        &self,
        runtime: Option<ConsistencyLevel>,
        property: Option<&PropertyMeta>,
        policy: &ConsistencyPolicy,
    ) -> MapperResult<ConsistencyLevel> {
        if self.is_view() {
            return Err(self.view_mutation_error("write consistency"));
        }
        let default = if self.is_counter_table() {
            policy.counter_write.unwrap_or(policy.write)
        } else {
            policy.write
        };
        Ok(consistency::resolve(
            runtime,
            property.and_then(PropertyMeta::write_consistency),
            self.write_consistency,
            default,
        ))
    }

    /// Resolves the serial consistency for a conditional mutation.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views.
    pub fn serial_consistency(
        &self,
        runtime: Option<ConsistencyLevel>,
        policy: &ConsistencyPolicy,
    ) -> MapperResult<ConsistencyLevel> {
        if self.is_view() {
            return Err(self.view_mutation_error("serial consistency"));
        }
        Ok(consistency::resolve(
            runtime,
            None,
            self.serial_consistency,
            policy.serial,
        ))
    }

    /// Dispatches a lifecycle event to the entity's interceptors.
    ///
    /// Views drop every event except [`Event::PostLoad`], which is
    /// forwarded normally.
    pub fn dispatch_event(
        &self,
        event: Event,
        payload: &dyn Any,
        interceptors: &[Arc<dyn Interceptor>],
    ) {
        if self.is_view() && event != Event::PostLoad {
            return;
        }
        for interceptor in interceptors {
            interceptor.on_event(event, payload);
        }
    }

    fn view_mutation_error(&self, what: &str) -> MapperError {
        MapperError::illegal_operation(
            self.type_name,
            format!(
                "cannot resolve {what} for materialized view {}",
                self.qualified_name()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::property::SortOrder;
    use entimap_session::CqlType;
    use parking_lot::Mutex;

    fn property(name: &'static str, role: ColumnRole) -> PropertyMeta {
        PropertyMeta::new(
            name,
            CqlType::Text,
            role,
            SortOrder::default(),
            None,
            None,
            None,
        )
    }

    fn table_meta() -> EntityMeta {
        EntityMeta {
            type_id: TypeId::of::<()>(),
            type_name: "Sample",
            keyspace: "app".into(),
            target_name: "samples",
            kind: EntityKind::Table,
            partition_keys: vec![property("pk", ColumnRole::PartitionKey)],
            clustering_keys: vec![property("ck", ColumnRole::ClusteringKey)],
            static_columns: vec![property("st", ColumnRole::Static)],
            regular_columns: vec![property("data", ColumnRole::Regular)],
            computed_columns: Vec::new(),
            counter_columns: Vec::new(),
            joins: Vec::new(),
            read_consistency: None,
            write_consistency: Some(ConsistencyLevel::Two),
            serial_consistency: None,
            insert_strategy: InsertStrategy::AllFields,
        }
    }

    fn view_meta() -> EntityMeta {
        let mut meta = table_meta();
        meta.type_name = "SampleByData";
        meta.target_name = "samples_by_data";
        meta.static_columns.clear();
        meta.kind = EntityKind::View {
            base: TypeId::of::<u8>(),
            base_name: "Sample",
            base_table: "samples".into(),
        };
        meta
    }

    #[test]
    fn all_columns_fixed_order() {
        let meta = table_meta();
        let names: Vec<_> = meta.all_columns().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["pk", "ck", "st", "data"]);
    }

    #[test]
    fn write_consistency_on_view_fails() {
        let meta = view_meta();
        let policy = ConsistencyPolicy::default();
        let result = meta.write_consistency(None, None, &policy);
        assert!(matches!(result, Err(MapperError::IllegalOperation { .. })));
    }

    #[test]
    fn serial_consistency_on_view_fails() {
        let meta = view_meta();
        let policy = ConsistencyPolicy::default();
        assert!(meta.serial_consistency(None, &policy).is_err());
    }

    #[test]
    fn insert_strategy_on_view_fails() {
        assert!(view_meta().insert_strategy().is_err());
        assert_eq!(
            table_meta().insert_strategy().unwrap(),
            InsertStrategy::AllFields
        );
    }

    #[test]
    fn read_consistency_allowed_on_view() {
        let meta = view_meta();
        let policy = ConsistencyPolicy::default();
        assert_eq!(
            meta.read_consistency(None, None, &policy),
            policy.read
        );
    }

    #[test]
    fn entity_default_applies_to_writes() {
        let meta = table_meta();
        let policy = ConsistencyPolicy::default();
        let level = meta.write_consistency(None, None, &policy).unwrap();
        assert_eq!(level, ConsistencyLevel::Two);
    }

    #[test]
    fn counter_write_default_applies() {
        let mut meta = table_meta();
        meta.write_consistency = None;
        meta.counter_columns = vec![property("hits", ColumnRole::Counter)];
        let policy = ConsistencyPolicy {
            counter_write: Some(ConsistencyLevel::All),
            ..ConsistencyPolicy::default()
        };
        let level = meta.write_consistency(None, None, &policy).unwrap();
        assert_eq!(level, ConsistencyLevel::All);
    }

    struct Recording(Mutex<Vec<Event>>);

    impl Interceptor for Recording {
        fn on_event(&self, event: Event, _payload: &dyn Any) {
            self.0.lock().push(event);
        }
    }

    #[test]
    fn view_drops_all_events_except_post_load() {
        let recorder = Arc::new(Recording(Mutex::new(Vec::new())));
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![recorder.clone()];
        let meta = view_meta();

        meta.dispatch_event(Event::PreInsert, &(), &interceptors);
        meta.dispatch_event(Event::PostDelete, &(), &interceptors);
        meta.dispatch_event(Event::PostLoad, &(), &interceptors);

        assert_eq!(*recorder.0.lock(), vec![Event::PostLoad]);
    }

    #[test]
    fn table_forwards_all_events() {
        let recorder = Arc::new(Recording(Mutex::new(Vec::new())));
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![recorder.clone()];
        let meta = table_meta();

        meta.dispatch_event(Event::PreInsert, &(), &interceptors);
        meta.dispatch_event(Event::PostLoad, &(), &interceptors);

        assert_eq!(*recorder.0.lock(), vec![Event::PreInsert, Event::PostLoad]);
    }
}
