//! Application layer: runtime wiring and the export orchestrator.

pub mod orchestrator;
pub mod runtime;
