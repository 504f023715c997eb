//! Error types for the mapper core.

use thiserror::Error;

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur during bootstrap and entity operations.
///
/// Every bootstrap-time error is fatal: registration either fully succeeds
/// or nothing is usable. Errors carry the offending entity type and, where
/// one applies, the offending column so failures are diagnosable without
/// re-running discovery.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Database session error.
    #[error("session error: {0}")]
    Session(#[from] entimap_session::SessionError),

    /// No entities were found where at least one is required.
    #[error("no entities found in packages [{packages}]")]
    Discovery {
        /// The namespace roots that were scanned.
        packages: String,
    },

    /// An entity declaration is malformed or carries conflicting column roles.
    #[error("failed to parse entity {entity}: {message}")]
    Parsing {
        /// The entity type that failed to parse.
        entity: &'static str,
        /// Description of the violation.
        message: String,
        /// The underlying cause, when parsing failed through another error.
        #[source]
        source: Option<Box<MapperError>>,
    },

    /// A join property references an entity that was never discovered.
    #[error("join property '{property}' on entity {entity} references undiscovered entity {target}")]
    JoinResolution {
        /// The entity declaring the join property.
        entity: &'static str,
        /// The join property name.
        property: String,
        /// The referenced target type.
        target: &'static str,
    },

    /// Declared metadata does not match the live schema.
    #[error("schema mismatch for entity {entity}{}: {message}", column_suffix(.column))]
    SchemaMismatch {
        /// The entity whose schema failed validation.
        entity: &'static str,
        /// The offending column, when the mismatch is column-level.
        column: Option<String>,
        /// Description of the mismatch.
        message: String,
    },

    /// An operation was requested that the entity kind does not support.
    #[error("illegal operation on entity {entity}: {message}")]
    IllegalOperation {
        /// The entity the operation targeted.
        entity: &'static str,
        /// Description of the rejected operation.
        message: String,
    },

    /// The configuration is invalid or incomplete.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },
}

fn column_suffix(column: &Option<String>) -> String {
    match column {
        Some(name) => format!(", column '{name}'"),
        None => String::new(),
    }
}

impl MapperError {
    /// Creates a discovery error naming the scanned roots.
    pub fn discovery(packages: &[String]) -> Self {
        Self::Discovery {
            packages: packages.join(", "),
        }
    }

    /// Creates a parsing error.
    pub fn parsing(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Parsing {
            entity,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps another error as the cause of a parsing failure.
    pub fn parsing_caused_by(
        entity: &'static str,
        message: impl Into<String>,
        cause: MapperError,
    ) -> Self {
        Self::Parsing {
            entity,
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Creates a join-resolution error.
    pub fn join_resolution(
        entity: &'static str,
        property: impl Into<String>,
        target: &'static str,
    ) -> Self {
        Self::JoinResolution {
            entity,
            property: property.into(),
            target,
        }
    }

    /// Creates a schema-mismatch error without a column.
    pub fn schema_mismatch(entity: &'static str, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            entity,
            column: None,
            message: message.into(),
        }
    }

    /// Creates a schema-mismatch error naming the offending column.
    pub fn schema_mismatch_column(
        entity: &'static str,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            entity,
            column: Some(column.into()),
            message: message.into(),
        }
    }

    /// Creates an illegal-operation error.
    pub fn illegal_operation(entity: &'static str, message: impl Into<String>) -> Self {
        Self::IllegalOperation {
            entity,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
