//! Scoped ownership of intermediate files.

use log::warn;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An intermediate file that is deleted when the guard goes out of scope.
///
/// Each per-table artifact is wrapped in one of these as soon as its path is
/// chosen, so it is removed whether the stage that produced it succeeded,
/// failed half-way, or a later stage failed.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_.csv");
        std::fs::write(&path, "id\n").unwrap();

        {
            let staged = StagedFile::new(path.clone());
            assert!(staged.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::new(dir.path().join("never_written.csv"));
        drop(staged);
    }
}
