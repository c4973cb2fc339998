//! Concrete adapters for the database, the local filesystem and text encoding.

pub mod encoding;
pub mod local_storage;
pub mod mysql;
