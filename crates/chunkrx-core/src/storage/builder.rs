//! Builder for creating and preallocating the output temp file.

use std::fs::File;
use std::path::Path;

use super::writer::OutputWriter;
use crate::error::SinkError;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a new temp output file. Call `preallocate` (optional) then
/// `build` to get an `OutputWriter`.
pub struct OutputFileBuilder {
    file: File,
    temp_path: std::path::PathBuf,
}

impl OutputFileBuilder {
    /// Create a new temp file at `temp_path` (e.g. `out.bin.part`).
    /// Truncates if the path already exists.
    pub fn create(temp_path: &Path) -> Result<Self, SinkError> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .map_err(|source| SinkError::Create {
                path: temp_path.to_path_buf(),
                source,
            })?;
        Ok(OutputFileBuilder {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` so a full disk
    /// is detected before any chunk is written; falls back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> Result<(), SinkError> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file.set_len(size).map_err(|source| SinkError::Preallocate {
            path: self.temp_path.clone(),
            size,
            source,
        })
    }

    pub fn build(self) -> OutputWriter {
        OutputWriter::from_file_and_path(self.file, self.temp_path)
    }
}
