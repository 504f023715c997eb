//! In-memory session for testing.

use crate::consistency::{ClusterConsistency, ConsistencyLevel};
use crate::error::SessionResult;
use crate::metadata::{KeyspaceMetadata, SchemaDdl, SchemaObject};
use crate::session::Session;
use crate::statement::{BoundStatement, PreparedStatement, Row};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// A record of one executed statement, for assertions.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    /// CQL text of the executed statement.
    pub cql: String,
    /// Consistency level the statement ran at.
    pub consistency: ConsistencyLevel,
    /// Serial consistency, if one was set.
    pub serial_consistency: Option<ConsistencyLevel>,
    /// Number of bound values.
    pub value_count: usize,
}

/// An in-memory session.
///
/// Holds a mutable schema catalog and records every prepare, execute and
/// DDL call. Suitable for unit and integration tests; no network I/O.
///
/// # Example
///
/// ```rust
/// use entimap_session::{InMemorySession, KeyspaceMetadata, Session};
///
/// let session = InMemorySession::new()
///     .with_keyspace(KeyspaceMetadata::new("app"));
///
/// let prepared = session.prepare("SELECT id FROM app.users WHERE id = ?").unwrap();
/// assert_eq!(session.prepared_log().len(), 1);
/// assert_eq!(prepared.cql, "SELECT id FROM app.users WHERE id = ?");
/// ```
#[derive(Default)]
pub struct InMemorySession {
    catalog: RwLock<HashMap<String, KeyspaceMetadata>>,
    prepared: RwLock<Vec<String>>,
    executions: RwLock<Vec<ExecutionRecord>>,
    ddl: RwLock<Vec<String>>,
    canned_rows: RwLock<HashMap<String, Vec<Vec<Row>>>>,
    keyspace_fetches: AtomicUsize,
    cluster_consistency: ClusterConsistency,
}

impl InMemorySession {
    /// Creates an empty session with default cluster consistency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyspace snapshot to the catalog.
    #[must_use]
    pub fn with_keyspace(self, keyspace: KeyspaceMetadata) -> Self {
        self.catalog
            .write()
            .insert(keyspace.name.clone(), keyspace);
        self
    }

    /// Sets the cluster-wide default consistency levels.
    #[must_use]
    pub fn with_cluster_consistency(mut self, consistency: ClusterConsistency) -> Self {
        self.cluster_consistency = consistency;
        self
    }

    /// Queues result rows to be returned by the next execution of `cql`.
    ///
    /// Rows queued for the same text are returned in FIFO order, one batch
    /// per execution; executions with no queued batch return no rows.
    pub fn queue_rows(&self, cql: impl Into<String>, rows: Vec<Row>) {
        self.canned_rows
            .write()
            .entry(cql.into())
            .or_default()
            .push(rows);
    }

    /// Returns the CQL texts prepared so far, in order.
    #[must_use]
    pub fn prepared_log(&self) -> Vec<String> {
        self.prepared.read().clone()
    }

    /// Returns the executions performed so far, in order.
    #[must_use]
    pub fn execution_log(&self) -> Vec<ExecutionRecord> {
        self.executions.read().clone()
    }

    /// Returns the DDL texts applied so far, in order.
    #[must_use]
    pub fn ddl_log(&self) -> Vec<String> {
        self.ddl.read().clone()
    }

    /// Returns a copy of the current schema catalog.
    #[must_use]
    pub fn catalog(&self) -> HashMap<String, KeyspaceMetadata> {
        self.catalog.read().clone()
    }

    /// Returns how many keyspace metadata fetches have been served.
    #[must_use]
    pub fn keyspace_fetch_count(&self) -> usize {
        self.keyspace_fetches.load(Ordering::Relaxed)
    }
}

impl Session for InMemorySession {
    fn keyspace(&self, name: &str) -> SessionResult<Option<KeyspaceMetadata>> {
        self.keyspace_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.catalog.read().get(name).cloned())
    }

    fn prepare(&self, cql: &str) -> SessionResult<PreparedStatement> {
        self.prepared.write().push(cql.to_string());
        Ok(PreparedStatement::new(Uuid::new_v4(), cql))
    }

    fn execute(&self, statement: &BoundStatement) -> SessionResult<Vec<Row>> {
        self.executions.write().push(ExecutionRecord {
            cql: statement.prepared.cql.clone(),
            consistency: statement.consistency,
            serial_consistency: statement.serial_consistency,
            value_count: statement.values.len(),
        });

        let rows = self
            .canned_rows
            .write()
            .get_mut(&statement.prepared.cql)
            .and_then(|batches| {
                if batches.is_empty() {
                    None
                } else {
                    Some(batches.remove(0))
                }
            })
            .unwrap_or_default();
        Ok(rows)
    }

    fn execute_ddl(&self, ddl: &SchemaDdl) -> SessionResult<()> {
        self.ddl.write().push(ddl.cql.clone());

        let mut catalog = self.catalog.write();
        match &ddl.object {
            SchemaObject::Table(table) => {
                let ks = catalog
                    .entry(table.keyspace.clone())
                    .or_insert_with(|| KeyspaceMetadata::new(table.keyspace.clone()));
                ks.tables.insert(table.name.clone(), table.clone());
            }
            SchemaObject::View(view) => {
                let ks = catalog
                    .entry(view.keyspace.clone())
                    .or_insert_with(|| KeyspaceMetadata::new(view.keyspace.clone()));
                ks.views.insert(view.name.clone(), view.clone());
            }
        }
        Ok(())
    }

    fn cluster_consistency(&self) -> ClusterConsistency {
        self.cluster_consistency
    }
}

impl std::fmt::Debug for InMemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySession")
            .field("keyspaces", &self.catalog.read().len())
            .field("prepared", &self.prepared.read().len())
            .field("executions", &self.executions.read().len())
            .finish_non_exhaustive()
    }
}
