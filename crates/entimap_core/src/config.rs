//! Mapper configuration.

use crate::consistency::ConsistencyPolicy;
use crate::error::{MapperError, MapperResult};
use crate::serialize::SerializerFactory;
use serde::Deserialize;
use std::sync::Arc;

/// How the bootstrap treats the live schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaPolicy {
    /// Validate declared metadata against the live schema; never mutate it.
    /// A live superset of the declared columns is accepted.
    #[default]
    ValidateOnly,
    /// Generate and apply DDL for absent tables and views, then validate.
    CreateIfMissing,
    /// Validate without mutating, and require the live column set to match
    /// the declared set exactly.
    Strict,
}

/// Configuration map for opening a mapper.
///
/// The data half of the bootstrap input: everything here can come from an
/// external configuration file. Runtime collaborator handles (the session,
/// the scanner, the serializer factory, interceptors) are supplied on the
/// builder instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MapperOptions {
    /// Namespace roots to scan for entities. Required, non-empty.
    pub entity_packages: Vec<String>,

    /// Keyspace applied to entities that do not declare one.
    pub default_keyspace: Option<String>,

    /// Schema policy applied during bootstrap.
    pub schema_policy: SchemaPolicy,

    /// Whether join targets must share the consistency level of the
    /// entity declaring the join.
    pub enforce_join_consistency: bool,

    /// Consistency defaults overriding the cluster's own.
    pub consistency: Option<ConsistencyPolicy>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            entity_packages: Vec::new(),
            default_keyspace: None,
            schema_policy: SchemaPolicy::default(),
            enforce_join_consistency: false,
            consistency: None,
        }
    }
}

impl MapperOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespace root to scan for entities.
    #[must_use]
    pub fn scan_package(mut self, package: impl Into<String>) -> Self {
        self.entity_packages.push(package.into());
        self
    }

    /// Sets the default keyspace.
    #[must_use]
    pub fn default_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.default_keyspace = Some(keyspace.into());
        self
    }

    /// Sets the schema policy.
    #[must_use]
    pub fn schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    /// Sets whether join consistency is enforced.
    #[must_use]
    pub fn enforce_join_consistency(mut self, value: bool) -> Self {
        self.enforce_join_consistency = value;
        self
    }

    /// Sets consistency defaults overriding the cluster's.
    #[must_use]
    pub fn consistency(mut self, policy: ConsistencyPolicy) -> Self {
        self.consistency = Some(policy);
        self
    }

    /// Checks the options are complete enough to bootstrap.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no entity packages are set.
    pub fn validate(&self) -> MapperResult<()> {
        if self.entity_packages.is_empty() {
            return Err(MapperError::configuration(
                "at least one entity package must be configured",
            ));
        }
        Ok(())
    }
}

/// Immutable configuration bundle shared across the mapper.
///
/// Built once at bootstrap from [`MapperOptions`] plus the resolved
/// consistency policy and the optional serializer factory; read-only
/// thereafter.
#[derive(Clone)]
pub struct ConfigContext {
    options: MapperOptions,
    consistency: ConsistencyPolicy,
    serializer_factory: Option<Arc<dyn SerializerFactory>>,
}

impl ConfigContext {
    /// Creates the configuration context.
    #[must_use]
    pub fn new(
        options: MapperOptions,
        consistency: ConsistencyPolicy,
        serializer_factory: Option<Arc<dyn SerializerFactory>>,
    ) -> Self {
        Self {
            options,
            consistency,
            serializer_factory,
        }
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Returns the resolved global consistency policy.
    #[must_use]
    pub fn consistency(&self) -> &ConsistencyPolicy {
        &self.consistency
    }

    /// Returns the serializer factory, if one was configured.
    #[must_use]
    pub fn serializer_factory(&self) -> Option<&Arc<dyn SerializerFactory>> {
        self.serializer_factory.as_ref()
    }
}

impl std::fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigContext")
            .field("options", &self.options)
            .field("consistency", &self.consistency)
            .field("has_serializer_factory", &self.serializer_factory.is_some())
            .finish()
    }
}
