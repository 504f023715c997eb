//! Lifecycle events and interceptors.

use std::any::Any;
use std::fmt;

/// A lifecycle event around a CRUD operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Before an insert executes.
    PreInsert,
    /// After an insert executed successfully.
    PostInsert,
    /// Before a delete executes.
    PreDelete,
    /// After a delete executed successfully.
    PostDelete,
    /// After an entity row was successfully loaded.
    PostLoad,
}

impl Event {
    /// Returns `true` if the event marks a mutation.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::PostLoad)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreInsert => "pre-insert",
            Self::PostInsert => "post-insert",
            Self::PreDelete => "pre-delete",
            Self::PostDelete => "post-delete",
            Self::PostLoad => "post-load",
        };
        f.write_str(name)
    }
}

/// An application-supplied lifecycle hook.
///
/// Registered per entity type on the bootstrap builder. The payload is the
/// entity instance for mutations and the raw result row for loads;
/// implementations downcast to the type they registered for.
pub trait Interceptor: Send + Sync {
    /// Called when a lifecycle event fires for the registered entity type.
    fn on_event(&self, event: Event, payload: &dyn Any);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_classification() {
        assert!(Event::PreInsert.is_mutation());
        assert!(Event::PostDelete.is_mutation());
        assert!(!Event::PostLoad.is_mutation());
    }
}
