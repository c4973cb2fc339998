//! Ports: the traits the orchestrator talks to at the database seam.

pub mod extraction_port;
pub mod metadata_port;
