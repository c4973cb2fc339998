// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core error definitions for the MySQL CSV exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application. Variants map onto the stages of the
//! per-table pipeline so that a failure can be logged with the stage that
//! produced it.

use thiserror::Error;

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Column introspection failed for {table}: {reason}")]
    IntrospectionFailed { table: String, reason: String },

    #[error("Query generation failed for {table}: {reason}")]
    QueryBuildFailed { table: String, reason: String },

    #[error("Query failed for {table}: {reason}")]
    QueryFailed { table: String, reason: String },

    #[error("Row {row} scan failed: {reason}")]
    ScanFailed { row: usize, reason: String },

    #[error("CSV write failed for {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Character {ch:?} at byte {offset} has no {encoding} representation")]
    UnencodableCharacter {
        ch: char,
        offset: u64,
        encoding: String,
    },

    #[error("Transcoding failed for {path}: {reason}")]
    TranscodeFailed { path: String, reason: String },

    #[error("Archive creation failed: {0}")]
    ArchiveFailed(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("MySQL error: {0}")]
    MysqlError(String),
}

impl From<mysql::Error> for ExportError {
    fn from(e: mysql::Error) -> Self {
        ExportError::MysqlError(e.to_string())
    }
}

impl ExportError {
    pub fn introspection(table: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::IntrospectionFailed {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn query(table: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::QueryFailed {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transcode(path: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::TranscodeFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors that abort the run before any table is touched.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            ExportError::ConfigError(_) | ExportError::ConnectionError(_)
        )
    }
}

/// A specialized Result type for the MySQL CSV exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
