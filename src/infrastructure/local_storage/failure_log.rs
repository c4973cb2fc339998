//! Append-only log of the failures of one run.
//!
//! The file is created when the run starts. If nothing was written to it by
//! the end of the run it is removed, so its presence on disk means at least
//! one table (or the archive step) failed.

use crate::domain::entities::StageFailure;
use crate::domain::errors::Result;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FailureLog {
    path: PathBuf,
    file: File,
    bytes_written: u64,
    entries: usize,
}

impl FailureLog {
    /// `csv_export_log_YYYY_MM_DD_HH_MM_SS.txt`
    pub fn file_name(started: &DateTime<Local>) -> String {
        format!("csv_export_log_{}.txt", started.format("%Y_%m_%d_%H_%M_%S"))
    }

    pub fn create(dir: &Path, started: &DateTime<Local>) -> Result<Self> {
        let path = dir.join(Self::file_name(started));
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file,
            bytes_written: 0,
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Appends one CRLF-terminated line and flushes it to disk.
    pub fn record(&mut self, stage: &str, subject: &str, message: &str) -> Result<()> {
        let line = format!(
            "{} [{}] {}: {}\r\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            stage,
            subject,
            message.replace(['\r', '\n'], " ")
        );
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.bytes_written += line.len() as u64;
        self.entries += 1;
        Ok(())
    }

    pub fn record_failure(&mut self, failure: &StageFailure) -> Result<()> {
        self.record(&failure.stage.to_string(), &failure.table, &failure.reason)
    }

    /// Closes the log. Returns its path if it holds any entries; otherwise the
    /// empty file is deleted and `None` is returned.
    pub fn finish(self) -> Result<Option<PathBuf>> {
        let FailureLog {
            path,
            file,
            bytes_written,
            ..
        } = self;
        file.sync_all()?;
        drop(file);

        if bytes_written == 0 {
            std::fs::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ExportStage;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_is_sortable() {
        let ts = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            FailureLog::file_name(&ts),
            "csv_export_log_2024_03_07_09_05_01.txt"
        );
    }

    #[test]
    fn test_empty_log_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::create(dir.path(), &Local::now()).unwrap();
        let path = log.path().to_path_buf();
        assert!(path.exists());

        assert_eq!(log.finish().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_log_with_entries_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FailureLog::create(dir.path(), &Local::now()).unwrap();
        log.record_failure(&StageFailure {
            stage: ExportStage::Introspecting,
            table: "orders".into(),
            reason: "Table 'shop.orders' doesn't exist\nat line 1".into(),
        })
        .unwrap();
        assert_eq!(log.entries(), 1);

        let path = log.finish().unwrap().expect("log should be kept");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content
            .contains("[introspect] orders: Table 'shop.orders' doesn't exist at line 1"));
        assert!(content.ends_with("\r\n"));
    }
}
