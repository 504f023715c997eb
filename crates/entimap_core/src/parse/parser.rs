//! Entity parsing: descriptors to validated metadata.
//!
//! Parsing is a two-phase pipeline. Phase 1 ([`parse_entity`]) turns one
//! descriptor into an [`EntityMeta`] draft and records join references in
//! the shared [`ParsingContext`] - the target entity may not be parsed
//! yet, so resolution is deferred. Phase 2 ([`resolve_pending`]) runs
//! after every entity is parsed and resolves all deferred references
//! against the complete map, failing loudly on anything still missing.

use crate::config::MapperOptions;
use crate::descriptor::{EntityDescriptor, TargetKind};
use crate::error::{MapperError, MapperResult};
use crate::meta::{
    ColumnRole, EntityKind, EntityMeta, JoinMeta, PropertyMeta,
};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A join property waiting for its target entity to be parsed.
#[derive(Debug, Clone)]
struct PendingJoin {
    entity: TypeId,
    entity_name: &'static str,
    property: &'static str,
    target: TypeId,
    target_name: &'static str,
}

/// Transient state for one discovery pass.
///
/// Accumulates deferred join references and the counter-entity flag while
/// entities are parsed; consumed by [`resolve_pending`] and destroyed when
/// bootstrap completes.
#[derive(Debug, Default)]
pub struct ParsingContext {
    pending_joins: Vec<PendingJoin>,
    has_counter: bool,
}

impl ParsingContext {
    /// Creates an empty context for one discovery pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any parsed entity carries counter columns.
    #[must_use]
    pub const fn has_counter(&self) -> bool {
        self.has_counter
    }
}

/// Parses one descriptor into an [`EntityMeta`] draft.
///
/// Validates column-role consistency and records join-valued properties
/// into the context for the second pass.
///
/// # Errors
///
/// Fails with a parsing error, naming the entity and the offending
/// column, on any role violation.
pub fn parse_entity(
    ctx: &mut ParsingContext,
    descriptor: &EntityDescriptor,
    options: &MapperOptions,
) -> MapperResult<EntityMeta> {
    let entity = descriptor.type_name;
    debug!(entity, "parsing entity");

    let keyspace = descriptor
        .keyspace
        .map(str::to_string)
        .or_else(|| options.default_keyspace.clone())
        .ok_or_else(|| {
            MapperError::parsing(
                entity,
                "no keyspace declared on the entity and no default keyspace configured",
            )
        })?;

    let mut seen = HashSet::new();
    for property in &descriptor.properties {
        if !seen.insert(property.name) {
            return Err(MapperError::parsing(
                entity,
                format!("duplicate property name '{}'", property.name),
            ));
        }
    }

    let partition_keys = ordered_keys(descriptor, ColumnRole::PartitionKey)?;
    if partition_keys.is_empty() {
        return Err(MapperError::parsing(
            entity,
            "an entity must declare at least one partition key",
        ));
    }
    let clustering_keys = ordered_keys(descriptor, ColumnRole::ClusteringKey)?;

    let mut static_columns = Vec::new();
    let mut regular_columns = Vec::new();
    let mut computed_columns = Vec::new();
    let mut counter_columns = Vec::new();
    let mut joins = Vec::new();

    for property in &descriptor.properties {
        match property.role {
            ColumnRole::PartitionKey | ColumnRole::ClusteringKey => {}
            ColumnRole::Static => static_columns.push(property_meta(property)),
            ColumnRole::Regular => {
                if let Some(target) = property.join_target {
                    ctx.pending_joins.push(PendingJoin {
                        entity: descriptor.type_id,
                        entity_name: entity,
                        property: property.name,
                        target: target.type_id,
                        target_name: target.type_name,
                    });
                    joins.push(JoinMeta {
                        property: property.name,
                        target: target.type_id,
                        target_name: target.type_name,
                        target_table: String::new(),
                    });
                }
                regular_columns.push(property_meta(property));
            }
            ColumnRole::Computed => {
                if property.computed.is_none() {
                    return Err(MapperError::parsing(
                        entity,
                        format!(
                            "computed column '{}' declares no projection function",
                            property.name
                        ),
                    ));
                }
                computed_columns.push(property_meta(property));
            }
            ColumnRole::Counter => counter_columns.push(property_meta(property)),
        }
    }

    if !counter_columns.is_empty() && !regular_columns.is_empty() {
        return Err(MapperError::parsing(
            entity,
            format!(
                "counter column '{}' cannot be mixed with regular data columns",
                counter_columns[0].name()
            ),
        ));
    }

    if !static_columns.is_empty() && clustering_keys.is_empty() {
        return Err(MapperError::parsing(
            entity,
            format!(
                "static column '{}' requires at least one clustering key",
                static_columns[0].name()
            ),
        ));
    }

    let kind = match descriptor.kind {
        TargetKind::Table => EntityKind::Table,
        TargetKind::View { base, base_name } => {
            if let Some(column) = static_columns.first() {
                return Err(MapperError::parsing(
                    entity,
                    format!(
                        "materialized view cannot declare static column '{}'",
                        column.name()
                    ),
                ));
            }
            if let Some(column) = counter_columns.first() {
                return Err(MapperError::parsing(
                    entity,
                    format!(
                        "materialized view cannot declare counter column '{}'",
                        column.name()
                    ),
                ));
            }
            if descriptor.write_consistency.is_some() || descriptor.serial_consistency.is_some() {
                return Err(MapperError::parsing(
                    entity,
                    "materialized view cannot declare write or serial consistency",
                ));
            }
            EntityKind::View {
                base,
                base_name,
                base_table: String::new(),
            }
        }
    };

    ctx.has_counter |= !counter_columns.is_empty();

    Ok(EntityMeta {
        type_id: descriptor.type_id,
        type_name: entity,
        keyspace,
        target_name: descriptor.target_name,
        kind,
        partition_keys,
        clustering_keys,
        static_columns,
        regular_columns,
        computed_columns,
        counter_columns,
        joins,
        read_consistency: descriptor.read_consistency,
        write_consistency: descriptor.write_consistency,
        serial_consistency: descriptor.serial_consistency,
        insert_strategy: descriptor.insert_strategy,
    })
}

/// Resolves all deferred references against the complete draft map.
///
/// Fills in join target tables and view base tables. Order-independent:
/// entities may have been parsed in any order.
///
/// # Errors
///
/// Fails with a join-resolution error if a join target was never
/// discovered, and with a parsing error if a view's base entity is
/// missing or is itself a view.
pub fn resolve_pending(
    ctx: &ParsingContext,
    drafts: &mut HashMap<TypeId, EntityMeta>,
    options: &MapperOptions,
) -> MapperResult<()> {
    // Joins: look up every deferred target, then patch the owning drafts.
    let mut resolved = Vec::with_capacity(ctx.pending_joins.len());
    for pending in &ctx.pending_joins {
        let target = drafts.get(&pending.target).ok_or_else(|| {
            MapperError::join_resolution(pending.entity_name, pending.property, pending.target_name)
        })?;
        if options.enforce_join_consistency && target.is_view() {
            return Err(MapperError::parsing(
                pending.entity_name,
                format!(
                    "join property '{}' targets materialized view {} but join consistency \
                     enforcement requires a writable target",
                    pending.property, pending.target_name
                ),
            ));
        }
        resolved.push((
            pending.entity,
            pending.property,
            target.target_name().to_string(),
        ));
    }
    for (entity, property, target_table) in resolved {
        if let Some(draft) = drafts.get_mut(&entity) {
            if let Some(join) = draft.joins.iter_mut().find(|j| j.property == property) {
                join.target_table = target_table;
            }
        }
    }

    // View bases: every view must derive from a discovered table.
    let mut bases = Vec::new();
    for draft in drafts.values() {
        if let EntityKind::View {
            base, base_name, ..
        } = &draft.kind
        {
            let base_meta = drafts.get(base).ok_or_else(|| {
                MapperError::parsing(
                    draft.type_name,
                    format!("base entity {base_name} for this view was never discovered"),
                )
            })?;
            if base_meta.is_view() {
                return Err(MapperError::parsing(
                    draft.type_name,
                    format!("base entity {base_name} is itself a materialized view"),
                ));
            }
            bases.push((draft.type_id, base_meta.target_name().to_string()));
        }
    }
    for (view, base_table) in bases {
        if let Some(draft) = drafts.get_mut(&view) {
            if let EntityKind::View {
                base_table: slot, ..
            } = &mut draft.kind
            {
                *slot = base_table;
            }
        }
    }

    Ok(())
}

fn property_meta(property: &crate::descriptor::PropertyDescriptor) -> PropertyMeta {
    PropertyMeta::new(
        property.name,
        property.cql_type.clone(),
        property.role,
        property.clustering_order,
        property.read_consistency,
        property.write_consistency,
        property.computed.clone(),
    )
}

/// Collects the key columns of one role, validated and in declared order.
fn ordered_keys(
    descriptor: &EntityDescriptor,
    role: ColumnRole,
) -> MapperResult<Vec<PropertyMeta>> {
    let entity = descriptor.type_name;
    let mut keys: Vec<_> = descriptor
        .properties
        .iter()
        .filter(|p| p.role == role)
        .collect();

    for key in &keys {
        if key.key_index.is_none() {
            return Err(MapperError::parsing(
                entity,
                format!("{role} column '{}' declares no ordinal", key.name),
            ));
        }
    }
    keys.sort_by_key(|p| p.key_index);

    for (position, key) in keys.iter().enumerate() {
        let index = key.key_index.unwrap_or_default();
        if index != position {
            return Err(MapperError::parsing(
                entity,
                format!(
                    "{role} ordinals must be contiguous from 0: column '{}' declares {index}, \
                     expected {position}",
                    key.name
                ),
            ));
        }
    }

    Ok(keys.into_iter().map(|p| property_meta(p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PropertyDescriptor;
    use entimap_session::CqlType;

    struct Author;
    struct Book;
    struct BooksByTitle;

    fn author() -> EntityDescriptor {
        EntityDescriptor::table::<Author>("authors", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::regular("name", CqlType::Text))
    }

    fn book() -> EntityDescriptor {
        EntityDescriptor::table::<Book>("books", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("isbn", CqlType::Text, 0))
            .with_property(PropertyDescriptor::clustering_key(
                "edition",
                CqlType::Int,
                0,
            ))
            .with_property(PropertyDescriptor::join::<Author>("author_id", CqlType::Uuid))
            .with_property(PropertyDescriptor::regular("title", CqlType::Text))
    }

    fn books_by_title() -> EntityDescriptor {
        EntityDescriptor::view::<BooksByTitle, Book>("books_by_title", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("title", CqlType::Text, 0))
            .with_property(PropertyDescriptor::clustering_key("isbn", CqlType::Text, 0))
            .with_property(PropertyDescriptor::clustering_key(
                "edition",
                CqlType::Int,
                1,
            ))
    }

    fn options() -> MapperOptions {
        MapperOptions::new().scan_package(module_path!())
    }

    fn parse_all(descriptors: &[EntityDescriptor]) -> (ParsingContext, HashMap<TypeId, EntityMeta>) {
        let options = options();
        let mut ctx = ParsingContext::new();
        let mut drafts = HashMap::new();
        for descriptor in descriptors {
            let meta = parse_entity(&mut ctx, descriptor, &options).unwrap();
            drafts.insert(meta.type_id(), meta);
        }
        (ctx, drafts)
    }

    #[test]
    fn parses_simple_table() {
        let (ctx, drafts) = parse_all(&[author()]);
        assert!(!ctx.has_counter());
        let meta = &drafts[&TypeId::of::<Author>()];
        assert_eq!(meta.partition_keys().len(), 1);
        assert_eq!(meta.keyspace(), "app");
        assert!(meta.is_table());
    }

    #[test]
    fn missing_partition_key_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::regular("name", CqlType::Text));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(matches!(result, Err(MapperError::Parsing { .. })));
    }

    #[test]
    fn duplicate_property_rejected() {
        let descriptor = author().with_property(PropertyDescriptor::regular("name", CqlType::Text));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("'name'"));
    }

    #[test]
    fn gapped_key_ordinals_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("a", CqlType::Text, 0))
            .with_property(PropertyDescriptor::partition_key("b", CqlType::Text, 2));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("'b'"));
        assert!(message.contains("contiguous"));
    }

    #[test]
    fn duplicate_key_ordinals_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("a", CqlType::Text, 0))
            .with_property(PropertyDescriptor::partition_key("b", CqlType::Text, 0));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(result.is_err());
    }

    #[test]
    fn missing_keyspace_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(result.is_err());
    }

    #[test]
    fn default_keyspace_applies() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0));
        let options = options().default_keyspace("fallback");
        let meta = parse_entity(&mut ParsingContext::new(), &descriptor, &options).unwrap();
        assert_eq!(meta.keyspace(), "fallback");
    }

    #[test]
    fn counter_mixed_with_regular_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("stats", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::counter("hits"))
            .with_property(PropertyDescriptor::regular("label", CqlType::Text));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("'hits'"));
    }

    #[test]
    fn counter_entity_sets_context_flag() {
        let descriptor = EntityDescriptor::table::<Author>("stats", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::counter("hits"));
        let mut ctx = ParsingContext::new();
        parse_entity(&mut ctx, &descriptor, &options()).unwrap();
        assert!(ctx.has_counter());
    }

    #[test]
    fn static_without_clustering_rejected() {
        let descriptor = EntityDescriptor::table::<Author>("authors", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::static_column("bio", CqlType::Text));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(result.is_err());
    }

    #[test]
    fn view_with_static_column_rejected() {
        let descriptor = books_by_title()
            .with_property(PropertyDescriptor::static_column("blurb", CqlType::Text));
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(result.is_err());
    }

    #[test]
    fn view_with_write_consistency_rejected() {
        let descriptor =
            books_by_title().write_consistency(entimap_session::ConsistencyLevel::Quorum);
        let result = parse_entity(&mut ParsingContext::new(), &descriptor, &options());
        assert!(result.is_err());
    }

    #[test]
    fn join_resolution_in_declaration_order() {
        let (ctx, mut drafts) = parse_all(&[author(), book(), books_by_title()]);
        resolve_pending(&ctx, &mut drafts, &options()).unwrap();

        let book_meta = &drafts[&TypeId::of::<Book>()];
        let join = &book_meta.joins()[0];
        assert_eq!(join.target(), TypeId::of::<Author>());
        assert_eq!(join.target_table(), "authors");

        let view_meta = &drafts[&TypeId::of::<BooksByTitle>()];
        assert_eq!(view_meta.view_base().unwrap().1, "books");
    }

    #[test]
    fn join_resolution_in_reverse_order() {
        // Discovery order must not matter: parse the referencing entity first.
        let (ctx, mut drafts) = parse_all(&[books_by_title(), book(), author()]);
        resolve_pending(&ctx, &mut drafts, &options()).unwrap();

        let book_meta = &drafts[&TypeId::of::<Book>()];
        assert_eq!(book_meta.joins()[0].target_table(), "authors");
    }

    #[test]
    fn unresolved_join_target_fails() {
        let (ctx, mut drafts) = parse_all(&[book()]);
        let result = resolve_pending(&ctx, &mut drafts, &options());
        match result {
            Err(MapperError::JoinResolution {
                entity,
                property,
                target,
            }) => {
                assert_eq!(entity, "Book");
                assert_eq!(property, "author_id");
                assert_eq!(target, "Author");
            }
            other => panic!("expected a join-resolution error, got {other:?}"),
        }
    }

    #[test]
    fn view_base_never_discovered_fails() {
        let (ctx, mut drafts) = parse_all(&[books_by_title()]);
        let result = resolve_pending(&ctx, &mut drafts, &options());
        assert!(matches!(result, Err(MapperError::Parsing { .. })));
    }
}
