//! Schema generation and validation.

mod generate;
mod validate;

pub use generate::generate_ddl;
pub use validate::{ensure_schema, validate_entity};
