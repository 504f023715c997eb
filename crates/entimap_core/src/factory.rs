//! Mapper bootstrap and runtime facade.

use crate::config::{ConfigContext, MapperOptions};
use crate::consistency::ConsistencyPolicy;
use crate::descriptor::Entity;
use crate::error::{MapperError, MapperResult};
use crate::interceptor::{Event, Interceptor};
use crate::meta::{EntityMeta, EntityMetaMap};
use crate::parse::{discover_entities, parse_entity, resolve_pending, EntityScanner, ParsingContext};
use crate::schema::ensure_schema;
use crate::serialize::SerializerFactory;
use crate::statements::{prepare_statements, OperationKind, StatementsCache};
use entimap_session::{
    BoundStatement, ConsistencyLevel, CqlValue, PreparedStatement, Row, Session,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Per-call consistency override for reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Runtime consistency override; beats every configured default.
    pub consistency: Option<ConsistencyLevel>,
}

impl ReadOptions {
    /// Creates options with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime consistency override.
    #[must_use]
    pub const fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }
}

/// Per-call consistency overrides for mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Runtime consistency override; beats every configured default.
    pub consistency: Option<ConsistencyLevel>,
    /// Serial consistency for conditional mutations.
    pub serial_consistency: Option<ConsistencyLevel>,
}

impl WriteOptions {
    /// Creates options with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime consistency override.
    #[must_use]
    pub const fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    /// Sets the serial consistency.
    #[must_use]
    pub const fn serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }
}

/// Builder for bootstrapping a [`Mapper`].
///
/// Collects the collaborator handles (session, scanner, serializer
/// factory, interceptors) and the configuration map, then runs the
/// one-time bootstrap pipeline.
pub struct MapperBuilder {
    session: Arc<dyn Session>,
    scanner: Box<dyn EntityScanner>,
    options: MapperOptions,
    serializer_factory: Option<Arc<dyn SerializerFactory>>,
    interceptors: HashMap<TypeId, Vec<Arc<dyn Interceptor>>>,
}

impl MapperBuilder {
    /// Creates a builder over the given session and entity scanner.
    #[must_use]
    pub fn new(session: Arc<dyn Session>, scanner: Box<dyn EntityScanner>) -> Self {
        Self {
            session,
            scanner,
            options: MapperOptions::default(),
            serializer_factory: None,
            interceptors: HashMap::new(),
        }
    }

    /// Sets the configuration options.
    #[must_use]
    pub fn options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the serializer factory used by instance-level CRUD.
    #[must_use]
    pub fn serializer_factory(mut self, factory: Arc<dyn SerializerFactory>) -> Self {
        self.serializer_factory = Some(factory);
        self
    }

    /// Registers a lifecycle interceptor for one entity type.
    #[must_use]
    pub fn interceptor<T: Entity>(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors
            .entry(TypeId::of::<T>())
            .or_default()
            .push(interceptor);
        self
    }

    /// Runs the bootstrap pipeline: discover, parse, resolve, apply the
    /// schema policy, prepare statements, freeze.
    ///
    /// The pipeline is single-threaded and must complete before CRUD
    /// traffic begins. Any failure aborts bootstrap; no partial entity
    /// registration survives.
    ///
    /// # Errors
    ///
    /// Fails with a discovery, parsing, join-resolution, schema-mismatch
    /// or configuration error.
    pub fn bootstrap(self) -> MapperResult<Mapper> {
        info!("bootstrapping entity mapper");
        self.options.validate()?;

        let policy: ConsistencyPolicy = self
            .options
            .consistency
            .unwrap_or_else(|| self.session.cluster_consistency().into());

        // Phase 1: discover and parse every entity, deferring joins.
        let descriptors = discover_entities(self.scanner.as_ref(), &self.options.entity_packages)?;
        let mut ctx = ParsingContext::new();
        let mut drafts = HashMap::new();
        for descriptor in &descriptors {
            let meta = parse_entity(&mut ctx, descriptor, &self.options)?;
            if drafts.insert(meta.type_id(), meta).is_some() {
                return Err(MapperError::parsing(
                    descriptor.type_name,
                    "entity type registered more than once",
                ));
            }
        }

        // Phase 2: resolve deferred joins and view bases.
        resolve_pending(&ctx, &mut drafts, &self.options)?;

        // Schema, statements, freeze.
        ensure_schema(self.session.as_ref(), self.options.schema_policy, &drafts)?;

        let statements = StatementsCache::new();
        for meta in drafts.values() {
            prepare_statements(meta, self.session.as_ref(), &statements)?;
        }

        let has_counter = ctx.has_counter();
        let metas = EntityMetaMap::freeze(drafts);
        info!(
            entities = metas.len(),
            statements = statements.len(),
            has_counter,
            "entity mapper ready"
        );

        Ok(Mapper {
            session: self.session,
            config: ConfigContext::new(self.options, policy, self.serializer_factory),
            metas,
            statements,
            interceptors: self.interceptors,
            has_counter,
        })
    }
}

/// The bootstrapped persistence manager.
///
/// Immutable after bootstrap: the metadata registry and statement cache
/// are shared read-only state, safe for arbitrarily many concurrent
/// callers. Every database interaction is a blocking call through the
/// session collaborator.
pub struct Mapper {
    session: Arc<dyn Session>,
    config: ConfigContext,
    metas: EntityMetaMap,
    statements: StatementsCache,
    interceptors: HashMap<TypeId, Vec<Arc<dyn Interceptor>>>,
    has_counter: bool,
}

impl Mapper {
    /// Looks up the metadata for a registered entity type.
    #[must_use]
    pub fn meta<T: Entity>(&self) -> Option<&Arc<EntityMeta>> {
        self.metas.get::<T>()
    }

    /// Looks up metadata by raw type id.
    #[must_use]
    pub fn meta_by_id(&self, type_id: TypeId) -> Option<&Arc<EntityMeta>> {
        self.metas.get_by_id(type_id)
    }

    /// Returns the statement template for an entity and operation.
    ///
    /// Cached templates are returned as-is; a missing entry is prepared
    /// and inserted once. Lookups never re-trigger schema fetches.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error for unregistered entities and an
    /// illegal-operation error for view mutations.
    pub fn statement<T: Entity>(
        &self,
        operation: OperationKind,
    ) -> MapperResult<Arc<PreparedStatement>> {
        let meta = self.require_meta::<T>()?;
        self.statements
            .get_or_prepare(meta, operation, self.session.as_ref())
    }

    /// Returns `true` if any registered entity carries counter columns.
    ///
    /// Callers use this to apply cluster-wide counter consistency
    /// defaults.
    #[must_use]
    pub const fn has_counter_entities(&self) -> bool {
        self.has_counter
    }

    /// Returns the number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.metas.len()
    }

    /// Returns the configuration context.
    #[must_use]
    pub const fn config(&self) -> &ConfigContext {
        &self.config
    }

    /// Inserts an entity instance.
    pub fn insert<T: Entity>(&self, entity: &T) -> MapperResult<()> {
        self.insert_with(entity, WriteOptions::default())
    }

    /// Inserts an entity instance with per-call overrides.
    ///
    /// Fires `PreInsert` before and `PostInsert` after execution.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views, and a
    /// configuration error when no serializer is available for `T`.
    pub fn insert_with<T: Entity>(&self, entity: &T, options: WriteOptions) -> MapperResult<()> {
        let meta = self.require_meta::<T>()?.clone();
        let statement = self.statement::<T>(OperationKind::Insert)?;
        let values = self.serializer_for(&meta)?.insert_values(entity)?;
        let consistency = meta.write_consistency(options.consistency, None, self.config.consistency())?;

        let mut bound = BoundStatement::new(statement, values, consistency);
        if let Some(serial) = options.serial_consistency {
            bound = bound.with_serial_consistency(serial);
        }

        let interceptors = self.interceptors_for(meta.type_id());
        meta.dispatch_event(Event::PreInsert, entity, interceptors);
        self.session.execute(&bound)?;
        meta.dispatch_event(Event::PostInsert, entity, interceptors);
        Ok(())
    }

    /// Deletes an entity instance by its primary key.
    pub fn delete<T: Entity>(&self, entity: &T) -> MapperResult<()> {
        self.delete_with(entity, WriteOptions::default())
    }

    /// Deletes an entity instance with per-call overrides.
    ///
    /// Fires `PreDelete` before and `PostDelete` after execution.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views, and a
    /// configuration error when no serializer is available for `T`.
    pub fn delete_with<T: Entity>(&self, entity: &T, options: WriteOptions) -> MapperResult<()> {
        let meta = self.require_meta::<T>()?.clone();
        let statement = self.statement::<T>(OperationKind::DeleteByKey)?;
        let key = self.serializer_for(&meta)?.key_values(entity)?;
        let consistency = meta.write_consistency(options.consistency, None, self.config.consistency())?;

        let bound = BoundStatement::new(statement, key, consistency);

        let interceptors = self.interceptors_for(meta.type_id());
        meta.dispatch_event(Event::PreDelete, entity, interceptors);
        self.session.execute(&bound)?;
        meta.dispatch_event(Event::PostDelete, entity, interceptors);
        Ok(())
    }

    /// Deletes one row by explicit primary-key values.
    ///
    /// Key values follow the declared order: partition keys, then
    /// clustering keys. No lifecycle events fire; there is no instance to
    /// dispatch them with.
    pub fn delete_by_key<T: Entity>(&self, key: Vec<CqlValue>) -> MapperResult<()> {
        self.delete_by_key_with::<T>(key, WriteOptions::default())
    }

    /// Deletes one row by key with per-call overrides.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for views.
    pub fn delete_by_key_with<T: Entity>(
        &self,
        key: Vec<CqlValue>,
        options: WriteOptions,
    ) -> MapperResult<()> {
        let meta = self.require_meta::<T>()?.clone();
        let statement = self.statement::<T>(OperationKind::DeleteByKey)?;
        let consistency = meta.write_consistency(options.consistency, None, self.config.consistency())?;
        self.session
            .execute(&BoundStatement::new(statement, key, consistency))?;
        Ok(())
    }

    /// Loads one row by explicit primary-key values.
    pub fn find_by_key<T: Entity>(&self, key: Vec<CqlValue>) -> MapperResult<Option<Row>> {
        self.find_by_key_with::<T>(key, ReadOptions::default())
    }

    /// Loads one row by key with per-call overrides.
    ///
    /// Returns the raw row; decoding it into the entity type belongs to
    /// the codec collaborator. Fires `PostLoad` with the row when one was
    /// found - on views as well, the one event they forward.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error for unregistered entities.
    pub fn find_by_key_with<T: Entity>(
        &self,
        key: Vec<CqlValue>,
        options: ReadOptions,
    ) -> MapperResult<Option<Row>> {
        let meta = self.require_meta::<T>()?.clone();
        let statement = self.statement::<T>(OperationKind::SelectByKey)?;
        let consistency = meta.read_consistency(options.consistency, None, self.config.consistency());

        let rows = self
            .session
            .execute(&BoundStatement::new(statement, key, consistency))?;
        let row = rows.into_iter().next();

        if let Some(row) = &row {
            meta.dispatch_event(Event::PostLoad, row, self.interceptors_for(meta.type_id()));
        }
        Ok(row)
    }

    fn require_meta<T: Entity>(&self) -> MapperResult<&Arc<EntityMeta>> {
        self.metas.get::<T>().ok_or_else(|| {
            MapperError::configuration(format!(
                "entity {} is not registered with this mapper",
                crate::descriptor::short_type_name::<T>()
            ))
        })
    }

    fn serializer_for(&self, meta: &EntityMeta) -> MapperResult<Arc<dyn crate::serialize::EntitySerializer>> {
        let factory = self.config.serializer_factory().ok_or_else(|| {
            MapperError::configuration("no serializer factory configured on the mapper")
        })?;
        factory.serializer(meta.type_id()).ok_or_else(|| {
            MapperError::configuration(format!(
                "no serializer registered for entity {}",
                meta.type_name()
            ))
        })
    }

    fn interceptors_for(&self, type_id: TypeId) -> &[Arc<dyn Interceptor>] {
        self.interceptors
            .get(&type_id)
            .map_or(&[], Vec::as_slice)
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("entities", &self.metas.len())
            .field("statements", &self.statements.len())
            .field("has_counter", &self.has_counter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaPolicy;
    use crate::descriptor::{EntityDescriptor, PropertyDescriptor};
    use crate::parse::StaticScanner;
    use crate::serialize::EntitySerializer;
    use entimap_session::{
        ColumnKind, ColumnMetadata, CqlType, InMemorySession, KeyspaceMetadata, TableMetadata,
    };
    use std::any::Any;
    use uuid::Uuid;

    struct Reader {
        id: Uuid,
        name: String,
    }

    impl Entity for Reader {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::table::<Self>("readers", module_path!())
                .in_keyspace("library")
                .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
                .with_property(PropertyDescriptor::regular("name", CqlType::Text))
        }
    }

    struct ReaderSerializer;

    impl EntitySerializer for ReaderSerializer {
        fn insert_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
            let reader = entity
                .downcast_ref::<Reader>()
                .ok_or_else(|| MapperError::configuration("expected a Reader instance"))?;
            Ok(vec![
                CqlValue::Uuid(reader.id),
                CqlValue::Text(reader.name.clone()),
            ])
        }

        fn key_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
            let reader = entity
                .downcast_ref::<Reader>()
                .ok_or_else(|| MapperError::configuration("expected a Reader instance"))?;
            Ok(vec![CqlValue::Uuid(reader.id)])
        }
    }

    struct ReaderFactory;

    impl SerializerFactory for ReaderFactory {
        fn serializer(&self, entity: TypeId) -> Option<Arc<dyn EntitySerializer>> {
            (entity == TypeId::of::<Reader>()).then(|| Arc::new(ReaderSerializer) as _)
        }
    }

    fn live_readers() -> KeyspaceMetadata {
        KeyspaceMetadata::new("library").with_table(
            TableMetadata::new("library", "readers")
                .with_column(ColumnMetadata::new("id", CqlType::Uuid, ColumnKind::PartitionKey))
                .with_column(ColumnMetadata::new("name", CqlType::Text, ColumnKind::Regular)),
        )
    }

    fn bootstrap(session: Arc<InMemorySession>) -> Mapper {
        MapperBuilder::new(
            session,
            Box::new(StaticScanner::new().register::<Reader>()),
        )
        .options(
            MapperOptions::new()
                .scan_package(module_path!())
                .schema_policy(SchemaPolicy::ValidateOnly),
        )
        .serializer_factory(Arc::new(ReaderFactory))
        .bootstrap()
        .unwrap()
    }

    #[test]
    fn bootstrap_registers_and_prepares() {
        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = bootstrap(session.clone());

        assert_eq!(mapper.entity_count(), 1);
        assert!(!mapper.has_counter_entities());
        assert!(mapper.meta::<Reader>().is_some());
        // Insert, select and delete were prepared eagerly.
        assert_eq!(session.prepared_log().len(), 3);
    }

    #[test]
    fn insert_executes_with_resolved_consistency() {
        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = bootstrap(session.clone());

        let reader = Reader {
            id: Uuid::new_v4(),
            name: "Ada".into(),
        };
        mapper
            .insert_with(&reader, WriteOptions::new().consistency(ConsistencyLevel::Quorum))
            .unwrap();

        let log = session.execution_log();
        assert_eq!(log.len(), 1);
        assert!(log[0].cql.starts_with("INSERT INTO library.readers"));
        assert_eq!(log[0].consistency, ConsistencyLevel::Quorum);
        assert_eq!(log[0].value_count, 2);
    }

    #[test]
    fn delete_uses_key_values_only() {
        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = bootstrap(session.clone());

        let reader = Reader {
            id: Uuid::new_v4(),
            name: "Ada".into(),
        };
        mapper.delete(&reader).unwrap();

        let log = session.execution_log();
        assert!(log[0].cql.starts_with("DELETE FROM library.readers"));
        assert_eq!(log[0].value_count, 1);
    }

    #[test]
    fn find_returns_first_row() {
        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = bootstrap(session.clone());

        let select = mapper
            .statement::<Reader>(OperationKind::SelectByKey)
            .unwrap();
        session.queue_rows(
            select.cql.clone(),
            vec![Row::new().with_column("name", CqlValue::Text("Ada".into()))],
        );

        let row = mapper
            .find_by_key::<Reader>(vec![CqlValue::Uuid(Uuid::new_v4())])
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&CqlValue::Text("Ada".into())));
    }

    #[test]
    fn missing_serializer_factory_is_a_configuration_error() {
        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = MapperBuilder::new(
            session,
            Box::new(StaticScanner::new().register::<Reader>()),
        )
        .options(MapperOptions::new().scan_package(module_path!()))
        .bootstrap()
        .unwrap();

        let reader = Reader {
            id: Uuid::new_v4(),
            name: "Ada".into(),
        };
        let result = mapper.insert(&reader);
        assert!(matches!(result, Err(MapperError::Configuration { .. })));
    }

    #[test]
    fn unregistered_entity_is_a_configuration_error() {
        struct Stranger;
        impl Entity for Stranger {
            fn descriptor() -> EntityDescriptor {
                EntityDescriptor::table::<Self>("strangers", module_path!())
            }
        }

        let session = Arc::new(InMemorySession::new().with_keyspace(live_readers()));
        let mapper = bootstrap(session);
        let result = mapper.statement::<Stranger>(OperationKind::SelectByKey);
        assert!(matches!(result, Err(MapperError::Configuration { .. })));
    }

    #[test]
    fn schema_mismatch_aborts_bootstrap() {
        let session = Arc::new(InMemorySession::new());
        let result = MapperBuilder::new(
            session,
            Box::new(StaticScanner::new().register::<Reader>()),
        )
        .options(MapperOptions::new().scan_package(module_path!()))
        .bootstrap();
        assert!(matches!(result, Err(MapperError::SchemaMismatch { .. })));
    }
}
