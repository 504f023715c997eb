//! Consistency levels requested from the storage cluster.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-operation durability/visibility guarantee requested from the cluster.
///
/// Mirrors the native protocol's consistency levels. `Serial` and
/// `LocalSerial` are only meaningful for lightweight-transaction reads and
/// the serial phase of conditional writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsistencyLevel {
    /// A write must be written to at least one node, hints count.
    Any,
    /// One replica must respond.
    One,
    /// Two replicas must respond.
    Two,
    /// Three replicas must respond.
    Three,
    /// A quorum of replicas across the cluster must respond.
    Quorum,
    /// All replicas must respond.
    All,
    /// A quorum of replicas in the local datacenter must respond.
    LocalQuorum,
    /// A quorum of replicas in each datacenter must respond.
    EachQuorum,
    /// One replica in the local datacenter must respond.
    LocalOne,
    /// Linearizable consistency for conditional operations.
    Serial,
    /// Linearizable consistency confined to the local datacenter.
    LocalSerial,
}

impl ConsistencyLevel {
    /// Returns `true` for the serial levels used by conditional operations.
    #[must_use]
    pub const fn is_serial(self) -> bool {
        matches!(self, Self::Serial | Self::LocalSerial)
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::LocalOne => "LOCAL_ONE",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
        };
        f.write_str(name)
    }
}

/// The cluster-wide default consistency levels.
///
/// Reported by a [`crate::Session`] and used as the last link of the
/// mapper's consistency resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConsistency {
    /// Default level for reads.
    pub read: ConsistencyLevel,
    /// Default level for writes.
    pub write: ConsistencyLevel,
    /// Default level for the serial phase of conditional writes.
    pub serial: ConsistencyLevel,
}

impl Default for ClusterConsistency {
    fn default() -> Self {
        Self {
            read: ConsistencyLevel::One,
            write: ConsistencyLevel::One,
            serial: ConsistencyLevel::Serial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_protocol_names() {
        assert_eq!(ConsistencyLevel::LocalQuorum.to_string(), "LOCAL_QUORUM");
        assert_eq!(ConsistencyLevel::One.to_string(), "ONE");
    }

    #[test]
    fn serde_kebab_case() {
        let level: ConsistencyLevel = serde_json::from_str("\"local-quorum\"").unwrap();
        assert_eq!(level, ConsistencyLevel::LocalQuorum);
    }

    #[test]
    fn serial_classification() {
        assert!(ConsistencyLevel::Serial.is_serial());
        assert!(ConsistencyLevel::LocalSerial.is_serial());
        assert!(!ConsistencyLevel::Quorum.is_serial());
    }
}
