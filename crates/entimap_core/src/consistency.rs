//! Consistency-level policy and resolution.

use entimap_session::{ClusterConsistency, ConsistencyLevel};
use serde::Deserialize;

/// Global consistency defaults for the mapper.
///
/// The last link of the resolution chain. Usually seeded from the
/// cluster's own defaults and optionally overridden in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConsistencyPolicy {
    /// Default read consistency.
    pub read: ConsistencyLevel,
    /// Default write consistency.
    pub write: ConsistencyLevel,
    /// Default serial consistency for conditional writes.
    pub serial: ConsistencyLevel,
    /// Write consistency applied to counter tables when set.
    pub counter_write: Option<ConsistencyLevel>,
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self {
            read: ConsistencyLevel::One,
            write: ConsistencyLevel::One,
            serial: ConsistencyLevel::Serial,
            counter_write: None,
        }
    }
}

impl From<ClusterConsistency> for ConsistencyPolicy {
    fn from(cluster: ClusterConsistency) -> Self {
        Self {
            read: cluster.read,
            write: cluster.write,
            serial: cluster.serial,
            counter_write: None,
        }
    }
}

/// Resolves a consistency level through the precedence chain.
///
/// First non-empty value wins: runtime override, then the per-property
/// default, then the per-entity default, then the global policy default.
#[must_use]
pub fn resolve(
    runtime: Option<ConsistencyLevel>,
    property: Option<ConsistencyLevel>,
    entity: Option<ConsistencyLevel>,
    policy_default: ConsistencyLevel,
) -> ConsistencyLevel {
    runtime.or(property).or(entity).unwrap_or(policy_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_default_wins_when_nothing_set() {
        let level = resolve(None, None, None, ConsistencyLevel::One);
        assert_eq!(level, ConsistencyLevel::One);
    }

    #[test]
    fn entity_beats_policy() {
        let level = resolve(None, None, Some(ConsistencyLevel::Two), ConsistencyLevel::One);
        assert_eq!(level, ConsistencyLevel::Two);
    }

    #[test]
    fn property_beats_entity() {
        let level = resolve(
            None,
            Some(ConsistencyLevel::Three),
            Some(ConsistencyLevel::Two),
            ConsistencyLevel::One,
        );
        assert_eq!(level, ConsistencyLevel::Three);
    }

    #[test]
    fn runtime_beats_everything() {
        let level = resolve(
            Some(ConsistencyLevel::All),
            Some(ConsistencyLevel::Three),
            Some(ConsistencyLevel::Two),
            ConsistencyLevel::One,
        );
        assert_eq!(level, ConsistencyLevel::All);
    }

    #[test]
    fn policy_from_cluster_defaults() {
        let cluster = ClusterConsistency::default();
        let policy = ConsistencyPolicy::from(cluster);
        assert_eq!(policy.read, cluster.read);
        assert!(policy.counter_write.is_none());
    }
}
