//! Table/view entity kinds.

use std::any::TypeId;

/// Whether an entity maps a table or a materialized view.
///
/// A tagged variant rather than a type hierarchy: variant-specific
/// behavior (mutation capability, statement surface, schema handling) is
/// dispatched through explicit queries on [`crate::meta::EntityMeta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A table-backed entity with full read/write capability.
    Table,
    /// A read-only materialized-view entity derived from a base table.
    View {
        /// The base entity type this view derives from.
        base: TypeId,
        /// The base entity's unqualified type name, for diagnostics.
        base_name: &'static str,
        /// The base entity's table name; resolved in the second parsing
        /// pass, once the base entity's metadata exists.
        base_table: String,
    },
}

impl EntityKind {
    /// Returns `true` for table-backed entities.
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Self::Table)
    }

    /// Returns `true` for view-backed entities.
    #[must_use]
    pub const fn is_view(&self) -> bool {
        matches!(self, Self::View { .. })
    }

    /// Returns `true` if entities of this kind accept mutations.
    #[must_use]
    pub const fn supports_mutation(&self) -> bool {
        self.is_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_queries() {
        let table = EntityKind::Table;
        assert!(table.is_table());
        assert!(!table.is_view());
        assert!(table.supports_mutation());

        let view = EntityKind::View {
            base: TypeId::of::<()>(),
            base_name: "Base",
            base_table: "base".into(),
        };
        assert!(view.is_view());
        assert!(!view.supports_mutation());
    }
}
