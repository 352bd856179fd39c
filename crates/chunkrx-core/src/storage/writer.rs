//! Sequential writer for the output temp file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SinkError;

/// Appends chunks to the temp file in order; `finalize` renames it into place.
pub struct OutputWriter {
    file: File,
    temp_path: PathBuf,
    written: u64,
}

impl OutputWriter {
    pub(crate) fn from_file_and_path(file: File, temp_path: PathBuf) -> Self {
        Self {
            file,
            temp_path,
            written: 0,
        }
    }

    /// Append `data` after everything written so far.
    pub fn append(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.file.write_all(data).map_err(|source| SinkError::Write {
            path: self.temp_path.clone(),
            source,
        })?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<(), SinkError> {
        self.file.sync_all().map_err(|source| SinkError::Sync {
            path: self.temp_path.clone(),
            source,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Atomically rename the temp file to the final path. Consumes the writer and closes the file.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> Result<(), SinkError> {
        let OutputWriter {
            file, temp_path, ..
        } = self;
        drop(file);
        std::fs::rename(&temp_path, final_path).map_err(|source| SinkError::Finalize {
            from: temp_path,
            to: final_path.to_path_buf(),
            source,
        })
    }

    /// Close and delete the temp file without producing output.
    pub fn discard(self) {
        let OutputWriter {
            file, temp_path, ..
        } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::debug!("could not remove {}: {}", temp_path.display(), e);
        }
    }
}
