//! Serializer collaborator interfaces.
//!
//! Field codecs live outside the mapper core. The core asks a
//! [`SerializerFactory`] for the per-entity serializer it needs at CRUD
//! time; how values get converted is entirely the collaborator's business.

use crate::error::MapperResult;
use entimap_session::CqlValue;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Converts entity instances of one type into driver values.
pub trait EntitySerializer: Send + Sync {
    /// Encodes the bind values for the entity's insert template, in the
    /// template's column order.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not of the expected type or a
    /// field cannot be converted.
    fn insert_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>>;

    /// Encodes the primary-key values, partition keys first, then
    /// clustering keys, in declared order.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not of the expected type or a
    /// key field cannot be converted.
    fn key_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>>;
}

/// Hands out per-entity serializers.
pub trait SerializerFactory: Send + Sync {
    /// Returns the serializer for the given entity type, or `None` if the
    /// factory does not know the type.
    fn serializer(&self, entity: TypeId) -> Option<Arc<dyn EntitySerializer>>;
}
