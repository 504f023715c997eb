//! # EntiMap Core
//!
//! Entity object-mapping core for column-family databases.
//!
//! This crate provides:
//! - Entity metadata model (tables, materialized views, column roles)
//! - Entity discovery and two-pass parsing with join resolution
//! - Schema generation and validation against live cluster metadata
//! - Prepared-statement generation and caching per entity and operation
//! - A bootstrapped persistence-manager facade with consistency control
//!
//! Bootstrap is a one-time sequential pipeline; afterwards the metadata
//! registry and statement cache are immutable, shared, read-only state.
//! The database session, the entity scanner and the field codecs are
//! collaborator interfaces - this crate calls into them and does not
//! implement them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use entimap_core::{MapperBuilder, MapperOptions, StaticScanner};
//! use std::sync::Arc;
//!
//! let mapper = MapperBuilder::new(
//!     Arc::new(session),
//!     Box::new(StaticScanner::new().register::<User>()),
//! )
//! .options(MapperOptions::new().scan_package("app::model"))
//! .bootstrap()?;
//!
//! let meta = mapper.meta::<User>().unwrap();
//! assert!(meta.is_table());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod consistency;
mod descriptor;
mod error;
mod factory;
mod interceptor;
mod meta;
mod parse;
mod schema;
mod serialize;
mod statements;

pub use config::{ConfigContext, MapperOptions, SchemaPolicy};
pub use consistency::{resolve as resolve_consistency, ConsistencyPolicy};
pub use descriptor::{Entity, EntityDescriptor, JoinTarget, PropertyDescriptor, TargetKind};
pub use error::{MapperError, MapperResult};
pub use factory::{Mapper, MapperBuilder, ReadOptions, WriteOptions};
pub use interceptor::{Event, Interceptor};
pub use meta::{
    ColumnRole, ComputedSpec, EntityKind, EntityMeta, EntityMetaMap, InsertStrategy, JoinMeta,
    PropertyMeta, SortOrder,
};
pub use parse::{discover_entities, parse_entity, resolve_pending, EntityScanner, ParsingContext,
    StaticScanner};
pub use schema::{ensure_schema, generate_ddl, validate_entity};
pub use serialize::{EntitySerializer, SerializerFactory};
pub use statements::{prepare_statements, statement_cql, OperationKind, StatementsCache};
