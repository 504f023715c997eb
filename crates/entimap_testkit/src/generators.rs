//! Property-based test generators using proptest.

use entimap_session::ConsistencyLevel;
use proptest::prelude::*;

/// Strategy for generating any consistency level.
pub fn consistency_level() -> impl Strategy<Value = ConsistencyLevel> {
    prop_oneof![
        Just(ConsistencyLevel::Any),
        Just(ConsistencyLevel::One),
        Just(ConsistencyLevel::Two),
        Just(ConsistencyLevel::Three),
        Just(ConsistencyLevel::Quorum),
        Just(ConsistencyLevel::All),
        Just(ConsistencyLevel::LocalQuorum),
        Just(ConsistencyLevel::EachQuorum),
        Just(ConsistencyLevel::LocalOne),
        Just(ConsistencyLevel::Serial),
        Just(ConsistencyLevel::LocalSerial),
    ]
}

/// Strategy for generating an optional consistency level.
pub fn optional_consistency_level() -> impl Strategy<Value = Option<ConsistencyLevel>> {
    prop::option::of(consistency_level())
}

/// Strategy for generating valid column and table identifiers.
pub fn identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,24}").expect("Invalid regex")
}
