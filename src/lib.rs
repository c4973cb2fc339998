//! # MySQL CSV Exporter
//!
//! Exports a configured list of MySQL tables to CSV files in a legacy
//! regional encoding (EUC-KR by default) and bundles them into one zip
//! archive. Tables that fail are skipped and recorded in a failure log.
//!
//! This crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! the orchestrator only talks to the database through the traits in
//! [`ports`], so it can be driven by in-memory fakes in tests.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;
