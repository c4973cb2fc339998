//! Local filesystem adapters: CSV output, the failure log, zip packaging and
//! intermediate-file cleanup.

pub mod csv_writer;
pub mod failure_log;
pub mod staged_file;
pub mod zip_archiver;
