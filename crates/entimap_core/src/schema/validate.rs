//! Schema validation against live cluster metadata.

use crate::config::SchemaPolicy;
use crate::error::{MapperError, MapperResult};
use crate::meta::EntityMeta;
use crate::schema::generate_ddl;
use entimap_session::{ColumnMetadata, KeyspaceMetadata, Session};
use std::any::TypeId;
use std::collections::HashMap;
use tracing::{debug, info};

/// Validates one entity's declared metadata against the live schema.
///
/// For a view, `base` must be the base entity's metadata; the view's
/// declared columns are additionally checked to be a subset of the base's.
/// With `strict`, the live column set must match the declared set exactly;
/// otherwise a live superset is accepted.
///
/// # Errors
///
/// Fails with a schema-mismatch error naming the entity and, for
/// column-level drift, the offending column.
pub fn validate_entity(
    session: &dyn Session,
    meta: &EntityMeta,
    base: Option<&EntityMeta>,
    strict: bool,
) -> MapperResult<()> {
    debug!(entity = meta.type_name(), "validating schema");

    let keyspace = fetch_keyspace(session, meta)?;

    let live_columns: &[ColumnMetadata] = match meta.view_base() {
        None => {
            let table = keyspace.table(meta.target_name()).ok_or_else(|| {
                MapperError::schema_mismatch(
                    meta.type_name(),
                    format!("table {} does not exist", meta.qualified_name()),
                )
            })?;
            &table.columns
        }
        Some((_, base_table)) => {
            let view = keyspace.view(meta.target_name()).ok_or_else(|| {
                MapperError::schema_mismatch(
                    meta.type_name(),
                    format!("materialized view {} does not exist", meta.qualified_name()),
                )
            })?;
            if keyspace.table(base_table).is_none() {
                return Err(MapperError::schema_mismatch(
                    meta.type_name(),
                    format!("base table {}.{base_table} does not exist", meta.keyspace()),
                ));
            }
            let base = base.ok_or_else(|| {
                MapperError::configuration(format!(
                    "base entity metadata missing for view {}",
                    meta.type_name()
                ))
            })?;
            validate_view_subset(meta, base)?;
            &view.columns
        }
    };

    for declared in meta.all_columns() {
        let live = live_columns
            .iter()
            .find(|c| c.name == declared.name())
            .ok_or_else(|| {
                MapperError::schema_mismatch_column(
                    meta.type_name(),
                    declared.name(),
                    "declared column is missing from the live schema",
                )
            })?;
        if live.cql_type != *declared.cql_type() {
            return Err(MapperError::schema_mismatch_column(
                meta.type_name(),
                declared.name(),
                format!(
                    "declared type {} but live schema has {}",
                    declared.cql_type(),
                    live.cql_type
                ),
            ));
        }
    }

    if strict {
        for live in live_columns {
            if !meta.all_columns().iter().any(|c| c.name() == live.name) {
                return Err(MapperError::schema_mismatch_column(
                    meta.type_name(),
                    live.name.clone(),
                    "live column is not declared on the entity",
                ));
            }
        }
    }

    Ok(())
}

/// Checks a view's declared columns against its base entity's.
fn validate_view_subset(view: &EntityMeta, base: &EntityMeta) -> MapperResult<()> {
    let base_names: Vec<&str> = base.all_columns().iter().map(|c| c.name()).collect();
    for column in view.all_columns() {
        if !base_names.contains(&column.name()) {
            return Err(MapperError::schema_mismatch_column(
                view.type_name(),
                column.name(),
                format!(
                    "column is not declared on base entity {}",
                    base.type_name()
                ),
            ));
        }
    }
    Ok(())
}

/// Applies the configured schema policy to every entity.
///
/// Tables are processed before views, so a view's base is always
/// validated or created first. Under `CreateIfMissing`, absent tables and
/// views are created from generated DDL and then validated; existing ones
/// are validated as-is. The other policies never mutate the schema.
///
/// # Errors
///
/// Fails on the first mismatch; bootstrap treats that as fatal.
pub fn ensure_schema(
    session: &dyn Session,
    policy: SchemaPolicy,
    drafts: &HashMap<TypeId, EntityMeta>,
) -> MapperResult<()> {
    info!(policy = ?policy, entities = drafts.len(), "applying schema policy");

    let mut ordered: Vec<&EntityMeta> = drafts.values().collect();
    ordered.sort_by_key(|meta| (meta.is_view(), meta.qualified_name()));

    for meta in ordered {
        let base = meta
            .view_base()
            .and_then(|(base_id, _)| drafts.get(&base_id));

        match policy {
            SchemaPolicy::ValidateOnly => validate_entity(session, meta, base, false)?,
            SchemaPolicy::Strict => validate_entity(session, meta, base, true)?,
            SchemaPolicy::CreateIfMissing => {
                if !target_exists(session, meta)? {
                    let ddl = generate_ddl(meta);
                    info!(entity = meta.type_name(), target = %meta.qualified_name(), "creating schema");
                    session.execute_ddl(&ddl)?;
                }
                validate_entity(session, meta, base, false)?;
            }
        }
    }

    Ok(())
}

fn target_exists(session: &dyn Session, meta: &EntityMeta) -> MapperResult<bool> {
    let keyspace = fetch_keyspace(session, meta)?;
    Ok(if meta.is_view() {
        keyspace.view(meta.target_name()).is_some()
    } else {
        keyspace.table(meta.target_name()).is_some()
    })
}

/// Fetches the entity's keyspace snapshot; a missing keyspace is always a
/// mismatch, creating keyspaces is not this layer's business.
fn fetch_keyspace(session: &dyn Session, meta: &EntityMeta) -> MapperResult<KeyspaceMetadata> {
    session.keyspace(meta.keyspace())?.ok_or_else(|| {
        MapperError::schema_mismatch(
            meta.type_name(),
            format!("keyspace {} does not exist", meta.keyspace()),
        )
    })
}
