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

//! # Runtime Context
//!
//! Sets up the resources a run needs before any table is touched:
//! 1. **Connection**: a single MySQL session, verified with a ping.
//! 2. **Adapters**: the metadata and extraction adapters sharing that session.
//!
//! Anything that fails here is a startup failure and aborts the run.

use crate::application::orchestrator::ExportOrchestrator;
use crate::config::ExportConfig;
use crate::domain::entities::ExportJob;
use crate::domain::errors::Result;
use crate::domain::query_builder::QueryBuilder;
use crate::infrastructure::mysql::connection_manager::MysqlConnection;
use crate::infrastructure::mysql::mysql_extraction_adapter::MysqlExtractionAdapter;
use crate::infrastructure::mysql::mysql_metadata_adapter::MysqlMetadataAdapter;
use std::sync::Arc;

/// `RuntimeContext` holds the shared resources that live for the whole run.
pub struct RuntimeContext {
    /// Both adapters share one connection, closed when the last of them is
    /// dropped.
    pub metadata: Arc<MysqlMetadataAdapter>,
    pub extraction: Arc<MysqlExtractionAdapter>,
}

impl RuntimeContext {
    /// Opens the connection and builds the adapters for `job`.
    pub fn init(job: &ExportJob, settings: &ExportConfig) -> Result<Self> {
        let connection = Arc::new(MysqlConnection::connect(
            job.connection(),
            settings.connect_timeout(),
            settings.query_timeout(),
        )?);

        let metadata = Arc::new(MysqlMetadataAdapter::new(
            connection.clone(),
            QueryBuilder::new(job.tables()),
        ));
        let extraction = Arc::new(MysqlExtractionAdapter::new(
            connection,
            settings.binary_format,
        ));

        Ok(Self {
            metadata,
            extraction,
        })
    }

    /// Wires the adapters into an orchestrator for `job`.
    pub fn orchestrator(
        &self,
        job: ExportJob,
        settings: ExportConfig,
    ) -> Result<ExportOrchestrator> {
        ExportOrchestrator::new(
            self.metadata.clone(),
            self.extraction.clone(),
            job,
            settings,
        )
    }
}
