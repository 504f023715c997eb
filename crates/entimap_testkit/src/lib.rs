//! # EntiMap Testkit
//!
//! Test utilities for EntiMap.
//!
//! This crate provides:
//! - Fixture entity types covering tables, views, counters and joins
//! - A live-schema catalog matching the fixtures
//! - A fixture serializer factory for instance-level CRUD tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entimap_core::{MapperBuilder, MapperOptions};
//! use entimap_testkit::prelude::*;
//! use std::sync::Arc;
//!
//! #[test]
//! fn test_with_fixtures() {
//!     let mapper = MapperBuilder::new(
//!         Arc::new(fixture_session()),
//!         Box::new(fixture_scanner()),
//!     )
//!     .options(MapperOptions::new().scan_package(fixture_package()))
//!     .bootstrap()
//!     .unwrap();
//!     // ... test operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
