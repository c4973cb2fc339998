//! The core application logic that drives the export of every configured
//! table.
//!
//! Each table goes through introspection, query synthesis, materialization,
//! CSV serialization and transcoding. A failure at any stage is recorded in
//! the failure log and the run moves on to the next table; only the tables
//! that made it through every stage are archived.

use crate::config::ExportConfig;
use crate::domain::entities::{
    ExportJob, ExportOutcome, ExportStage, RunSummary, StageFailure, TableReport,
};
use crate::domain::errors::{ExportError, Result};
use crate::domain::query_builder::QueryBuilder;
use crate::infrastructure::encoding::transcoder::Transcoder;
use crate::infrastructure::local_storage::csv_writer::CsvTableWriter;
use crate::infrastructure::local_storage::failure_log::FailureLog;
use crate::infrastructure::local_storage::staged_file::StagedFile;
use crate::infrastructure::local_storage::zip_archiver::ZipArchiver;
use crate::ports::extraction_port::ExtractionPort;
use crate::ports::metadata_port::MetadataPort;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates the sequential export of the tables of one job.
pub struct ExportOrchestrator {
    metadata_port: Arc<dyn MetadataPort>,
    extraction_port: Arc<dyn ExtractionPort>,
    job: ExportJob,
    settings: ExportConfig,
    queries: QueryBuilder,
    writer: CsvTableWriter,
    transcoder: Transcoder,
    archiver: ZipArchiver,
}

impl ExportOrchestrator {
    /// Fails only if the target encoding settings are unusable.
    pub fn new(
        metadata_port: Arc<dyn MetadataPort>,
        extraction_port: Arc<dyn ExtractionPort>,
        job: ExportJob,
        settings: ExportConfig,
    ) -> Result<Self> {
        let transcoder = Transcoder::new(
            settings.target_encoding()?,
            settings.on_unencodable,
            settings.replacement,
        )?;

        Ok(Self {
            metadata_port,
            extraction_port,
            queries: QueryBuilder::new(job.tables()),
            writer: CsvTableWriter::new(settings.line_ending),
            transcoder,
            archiver: ZipArchiver::new(),
            job,
            settings,
        })
    }

    /// Entry point for running the full export.
    ///
    /// Per-table failures end up in the returned summary and the failure log.
    /// The only errors returned are those that prevent the log or the archive
    /// from being produced at all.
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let output_dir = self.settings.output_path();
        std::fs::create_dir_all(&output_dir)?;

        let mut log = FailureLog::create(&output_dir, &chrono::Local::now())?;
        info!(
            "Exporting {} table(s) to {} ({})",
            self.job.tables().len(),
            output_dir.display(),
            self.transcoder.encoding_name()
        );

        let mut reports = Vec::with_capacity(self.job.tables().len());
        let mut staged = Vec::new();

        for table in self.job.tables() {
            let outcome = match self.export_table(table, &mut log) {
                Ok((file, rows)) => {
                    info!("{}: {} rows exported", table, rows);
                    let output = file.path().to_path_buf();
                    staged.push(file);
                    ExportOutcome::Success { output, rows }
                }
                Err(failure) => {
                    error!("{}", failure);
                    if let Err(e) = log.record_failure(&failure) {
                        warn!("Could not write to {}: {}", log.path().display(), e);
                    }
                    ExportOutcome::Failure(failure)
                }
            };
            reports.push(TableReport {
                table: table.clone(),
                outcome,
            });
        }

        let archive = self.settings.archive_path();
        let files: Vec<PathBuf> = staged.iter().map(|f| f.path().to_path_buf()).collect();
        let archived = self.archiver.create_archive(&archive, &files);
        // Transcoded files are removed whether or not the archive was written.
        drop(staged);

        if let Err(e) = &archived {
            error!("{}", e);
            let recorded = log.record("archive", &self.settings.archive_name, &e.to_string());
            if let Err(log_err) = recorded {
                warn!("Could not write to {}: {}", log.path().display(), log_err);
            }
        }

        let failures = log.entries();
        let log_file = log.finish()?;
        if let Some(path) = &log_file {
            warn!("{} failure(s) recorded in {}", failures, path.display());
        }
        archived?;

        let summary = RunSummary {
            reports,
            archive,
            log_file,
        };
        info!(
            "Export finished in {:.2}s: {} succeeded, {} failed, {} rows",
            start_time.elapsed().as_secs_f64(),
            summary.succeeded(),
            summary.failed(),
            summary.total_rows()
        );
        Ok(summary)
    }

    /// Runs one table through every stage.
    ///
    /// Returns the guard of the transcoded file, which must stay alive until
    /// the archive has been written.
    fn export_table(
        &self,
        table: &str,
        log: &mut FailureLog,
    ) -> std::result::Result<(StagedFile, usize), StageFailure> {
        info!("Processing {}", table);

        let columns = self
            .metadata_port
            .describe_columns(table)
            .map_err(at(ExportStage::Introspecting, table))?;

        let query = self
            .queries
            .build_select(&columns, table)
            .map_err(at(ExportStage::QueryBuilding, table))?;

        let rows = self
            .extraction_port
            .materialize(table, &query, &columns)
            .map_err(at(ExportStage::Querying, table))?;

        for failure in rows.scan_failures() {
            let err = ExportError::ScanFailed {
                row: failure.row,
                reason: failure.reason.clone(),
            };
            warn!("{}: {}", table, err);
            if let Err(e) = log.record("scan", table, &err.to_string()) {
                warn!("Could not write to {}: {}", log.path().display(), e);
            }
        }

        let output_dir = self.settings.output_path();
        let utf8 = StagedFile::new(output_dir.join(format!("{}_.csv", table)));
        self.writer
            .write(utf8.path(), rows.columns(), rows.rows())
            .map_err(at(ExportStage::Writing, table))?;

        let encoded = StagedFile::new(output_dir.join(format!("{}.csv", table)));
        self.transcoder
            .transcode(utf8.path(), encoded.path())
            .map_err(at(ExportStage::Transcoding, table))?;

        Ok((encoded, rows.row_count()))
    }
}

fn at(stage: ExportStage, table: &str) -> impl FnOnce(ExportError) -> StageFailure + '_ {
    move |e| StageFailure {
        stage,
        table: table.to_string(),
        reason: e.to_string(),
    }
}
