//! Bundles the per-table files into a single zip archive.

use crate::domain::errors::{ExportError, Result};
use chrono::{Datelike, Local, Timelike};
use log::info;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds zip archives atomically.
///
/// Entries are written to a temporary file next to the destination, which is
/// renamed into place only after every input has been copied. A failure at
/// any point leaves no archive (and no temporary file) behind.
#[derive(Debug, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }

    /// Stores each file under its base name, deflate-compressed, keeping its
    /// modification time.
    pub fn create_archive(&self, archive_path: &Path, files: &[PathBuf]) -> Result<()> {
        let dir = match archive_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".archive-")
            .suffix(".zip.tmp")
            .tempfile_in(dir)
            .map_err(|e| archive_error("cannot create temporary archive", dir, e))?;

        {
            let mut zip = ZipWriter::new(tmp.as_file_mut());
            for path in files {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        ExportError::ArchiveFailed(format!(
                            "invalid entry name: {}",
                            path.display()
                        ))
                    })?;

                let mut src = File::open(path).map_err(|e| archive_error("cannot open", path, e))?;
                let meta = src
                    .metadata()
                    .map_err(|e| archive_error("cannot stat", path, e))?;

                let mut options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .large_file(meta.len() >= u64::from(u32::MAX));
                if let Some(ts) = meta.modified().ok().and_then(zip_timestamp) {
                    options = options.last_modified_time(ts);
                }

                zip.start_file(name, options)
                    .map_err(|e| archive_error("cannot add entry for", path, e))?;
                io::copy(&mut src, &mut zip).map_err(|e| archive_error("cannot copy", path, e))?;
            }
            zip.finish()
                .map_err(|e| archive_error("cannot finalize", archive_path, e))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|e| archive_error("cannot sync", archive_path, e))?;
        tmp.persist(archive_path)
            .map_err(|e| archive_error("cannot move archive into", archive_path, e.error))?;

        info!(
            "Archived {} file(s) into {}",
            files.len(),
            archive_path.display()
        );
        Ok(())
    }
}

fn archive_error(action: &str, path: &Path, e: impl std::fmt::Display) -> ExportError {
    ExportError::ArchiveFailed(format!("{} {}: {}", action, path.display(), e))
}

/// Zip timestamps are local time with two-second resolution, 1980..=2107.
fn zip_timestamp(modified: SystemTime) -> Option<zip::DateTime> {
    let local: chrono::DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
