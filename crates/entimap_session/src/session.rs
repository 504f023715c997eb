//! Session trait definition.

use crate::consistency::ClusterConsistency;
use crate::error::SessionResult;
use crate::metadata::{KeyspaceMetadata, SchemaDdl};
use crate::statement::{BoundStatement, PreparedStatement, Row};

/// A handle to the database cluster.
///
/// The mapper core performs every database interaction through this trait:
/// schema metadata fetches during validation, statement preparation at
/// bootstrap, DDL application under the create-if-missing policy, and
/// statement execution at CRUD time.
///
/// # Invariants
///
/// - All calls are blocking; cancellation and timeouts are the
///   implementation's responsibility
/// - `keyspace` returns a point-in-time snapshot, never a live handle
/// - Implementations must be `Send + Sync`; concurrent callers issue
///   independent calls without coordination
///
/// # Implementors
///
/// - [`super::InMemorySession`] - For testing
pub trait Session: Send + Sync {
    /// Fetches the schema metadata snapshot for a keyspace.
    ///
    /// Returns `None` if the keyspace does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster cannot be reached.
    fn keyspace(&self, name: &str) -> SessionResult<Option<KeyspaceMetadata>>;

    /// Prepares a CQL statement against the cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement is rejected.
    fn prepare(&self, cql: &str) -> SessionResult<PreparedStatement>;

    /// Executes a bound statement and returns its result rows.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails.
    fn execute(&self, statement: &BoundStatement) -> SessionResult<Vec<Row>>;

    /// Applies a DDL statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema change is rejected.
    fn execute_ddl(&self, ddl: &SchemaDdl) -> SessionResult<()>;

    /// Returns the cluster-wide default consistency levels.
    fn cluster_consistency(&self) -> ClusterConsistency;
}
