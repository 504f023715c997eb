//! # EntiMap Session
//!
//! Session trait and schema metadata types for EntiMap.
//!
//! This crate defines the boundary between the mapper core and the
//! database cluster. A [`Session`] knows how to fetch live schema
//! metadata, prepare and execute statements, and report the cluster's
//! default consistency levels. The mapper core never speaks the wire
//! protocol itself - it talks to a `Session` implementation supplied by
//! the embedding application.
//!
//! ## Design Principles
//!
//! - Sessions are blocking; callers issue independent calls in parallel
//! - Schema metadata is a plain snapshot, never a live handle
//! - DDL is structured: rendered CQL plus the metadata image it creates
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Implementations
//!
//! - [`InMemorySession`] - For testing: mutable catalog plus statement,
//!   execution and DDL logs
//!
//! ## Example
//!
//! ```rust
//! use entimap_session::{InMemorySession, KeyspaceMetadata, Session};
//!
//! let session = InMemorySession::new()
//!     .with_keyspace(KeyspaceMetadata::new("library"));
//! let ks = session.keyspace("library").unwrap();
//! assert!(ks.is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod consistency;
mod error;
mod memory;
mod metadata;
mod session;
mod statement;

pub use consistency::{ClusterConsistency, ConsistencyLevel};
pub use error::{SessionError, SessionResult};
pub use memory::{ExecutionRecord, InMemorySession};
pub use metadata::{
    ColumnKind, ColumnMetadata, CqlType, KeyspaceMetadata, SchemaDdl, SchemaObject, TableMetadata,
    ViewMetadata,
};
pub use session::Session;
pub use statement::{BoundStatement, CqlValue, PreparedStatement, Row};
