//! Entity discovery over namespace roots.

use crate::descriptor::{Entity, EntityDescriptor};
use crate::error::{MapperError, MapperResult};
use tracing::info;

/// Enumerates entity descriptors under namespace roots.
///
/// The scanner is a collaborator: the embedding application decides how
/// entities get registered. [`StaticScanner`] is the in-process
/// implementation where entities are registered explicitly.
pub trait EntityScanner: Send + Sync {
    /// Returns the descriptors of all marked entities whose module path
    /// falls under one of the given namespace roots.
    fn scan(&self, packages: &[String]) -> Vec<EntityDescriptor>;
}

/// A scanner over an explicit registration list.
///
/// # Example
///
/// ```rust,ignore
/// let scanner = StaticScanner::new()
///     .register::<User>()
///     .register::<Post>();
/// ```
#[derive(Default)]
pub struct StaticScanner {
    descriptors: Vec<EntityDescriptor>,
}

impl StaticScanner {
    /// Creates an empty scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type.
    #[must_use]
    pub fn register<T: Entity>(mut self) -> Self {
        self.descriptors.push(T::descriptor());
        self
    }

    /// Registers a pre-built descriptor.
    #[must_use]
    pub fn register_descriptor(mut self, descriptor: EntityDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}

impl EntityScanner for StaticScanner {
    fn scan(&self, packages: &[String]) -> Vec<EntityDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| {
                packages.iter().any(|root| {
                    d.module_path == root
                        || d.module_path
                            .strip_prefix(root.as_str())
                            .is_some_and(|rest| rest.starts_with("::"))
                })
            })
            .cloned()
            .collect()
    }
}

/// Discovers the finite set of entities under the given namespace roots.
///
/// # Errors
///
/// Fails with a discovery error if no entities are found: a mapper with
/// nothing mapped is a configuration mistake, not an empty success.
pub fn discover_entities(
    scanner: &dyn EntityScanner,
    packages: &[String],
) -> MapperResult<Vec<EntityDescriptor>> {
    info!(packages = packages.join(", "), "discovering entities");

    let descriptors = scanner.scan(packages);
    if descriptors.is_empty() {
        return Err(MapperError::discovery(packages));
    }

    info!(count = descriptors.len(), "entities discovered");
    Ok(descriptors)
}
