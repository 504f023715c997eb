//! Statement generation and the prepared-statement cache.

use crate::error::{MapperError, MapperResult};
use crate::meta::EntityMeta;
use entimap_session::{PreparedStatement, Session};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The operation a statement template serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Insert (or counter-increment) of one entity row.
    Insert,
    /// Select of one entity row by its full primary key.
    SelectByKey,
    /// Delete of one entity row by its full primary key.
    DeleteByKey,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::SelectByKey => "select-by-key",
            Self::DeleteByKey => "delete-by-key",
        };
        f.write_str(name)
    }
}

/// Renders the CQL template for one entity and operation.
///
/// # Errors
///
/// Fails with an illegal-operation error when a mutation template is
/// requested for a materialized view.
pub fn statement_cql(meta: &EntityMeta, operation: OperationKind) -> MapperResult<String> {
    match operation {
        OperationKind::Insert => insert_cql(meta),
        OperationKind::SelectByKey => Ok(select_cql(meta)),
        OperationKind::DeleteByKey => delete_cql(meta),
    }
}

fn insert_cql(meta: &EntityMeta) -> MapperResult<String> {
    if meta.is_view() {
        return Err(view_statement_error(meta, OperationKind::Insert));
    }

    // Counters cannot be INSERTed; their mutation template is an
    // increment UPDATE over the full primary key.
    if meta.is_counter_table() {
        let increments = meta
            .counter_columns()
            .iter()
            .map(|c| format!("{} = {} + ?", c.name(), c.name()))
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(format!(
            "UPDATE {} SET {increments} WHERE {}",
            meta.qualified_name(),
            key_restriction(meta)
        ));
    }

    let columns: Vec<&str> = meta.all_columns().iter().map(|c| c.name()).collect();
    let markers = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({markers})",
        meta.qualified_name(),
        columns.join(", ")
    ))
}

fn select_cql(meta: &EntityMeta) -> String {
    let mut projection: Vec<String> = meta
        .all_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    for computed in meta.computed_columns() {
        if let Some(spec) = computed.computed() {
            projection.push(format!(
                "{}({}) AS {}",
                spec.function,
                spec.targets.join(", "),
                computed.name()
            ));
        }
    }

    format!(
        "SELECT {} FROM {} WHERE {}",
        projection.join(", "),
        meta.qualified_name(),
        key_restriction(meta)
    )
}

fn delete_cql(meta: &EntityMeta) -> MapperResult<String> {
    if meta.is_view() {
        return Err(view_statement_error(meta, OperationKind::DeleteByKey));
    }
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        meta.qualified_name(),
        key_restriction(meta)
    ))
}

fn key_restriction(meta: &EntityMeta) -> String {
    meta.key_columns()
        .iter()
        .map(|c| format!("{} = ?", c.name()))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn view_statement_error(meta: &EntityMeta, operation: OperationKind) -> MapperError {
    MapperError::illegal_operation(
        meta.type_name(),
        format!(
            "cannot generate {operation} statement for materialized view {}",
            meta.qualified_name()
        ),
    )
}

/// The prepared-statement cache, keyed by entity type and operation.
///
/// Entries are immutable once written and never evicted; the cache only
/// grows as entities are registered. Bootstrap populates it eagerly,
/// before concurrent read traffic begins, so the lock is only contended
/// on the insert-if-absent path of a lazy fill.
#[derive(Default)]
pub struct StatementsCache {
    entries: RwLock<HashMap<(TypeId, OperationKind), Arc<PreparedStatement>>>,
}

impl StatementsCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached template for an entity and operation.
    #[must_use]
    pub fn get(&self, type_id: TypeId, operation: OperationKind) -> Option<Arc<PreparedStatement>> {
        self.entries.read().get(&(type_id, operation)).cloned()
    }

    /// Returns the cached template, preparing and inserting it on first
    /// request. Lookups never re-trigger preparation once an entry exists;
    /// a racing first write keeps whichever entry landed first.
    ///
    /// # Errors
    ///
    /// Fails with an illegal-operation error for view mutations, or a
    /// session error if preparation fails.
    pub fn get_or_prepare(
        &self,
        meta: &EntityMeta,
        operation: OperationKind,
        session: &dyn Session,
    ) -> MapperResult<Arc<PreparedStatement>> {
        if let Some(statement) = self.get(meta.type_id(), operation) {
            return Ok(statement);
        }

        let cql = statement_cql(meta, operation)?;
        debug!(entity = meta.type_name(), %operation, "preparing statement");
        let prepared = Arc::new(session.prepare(&cql)?);

        let mut entries = self.entries.write();
        Ok(entries
            .entry((meta.type_id(), operation))
            .or_insert(prepared)
            .clone())
    }

    /// Returns the number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for StatementsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementsCache")
            .field("entries", &self.len())
            .finish()
    }
}

/// Prepares and caches the static statements for one entity.
///
/// Tables get insert, select and delete templates; views only ever get
/// the select template.
///
/// # Errors
///
/// Fails if any preparation is rejected by the session.
pub fn prepare_statements(
    meta: &EntityMeta,
    session: &dyn Session,
    cache: &StatementsCache,
) -> MapperResult<()> {
    debug!(entity = meta.type_name(), "preparing static statements");

    cache.get_or_prepare(meta, OperationKind::SelectByKey, session)?;
    if meta.is_table() {
        cache.get_or_prepare(meta, OperationKind::Insert, session)?;
        cache.get_or_prepare(meta, OperationKind::DeleteByKey, session)?;
    }
    Ok(())
}
