//! Domain layer: pure types and rules with no database or filesystem access.

pub mod cell;
pub mod entities;
pub mod errors;
pub mod export_options;
pub mod query_builder;
