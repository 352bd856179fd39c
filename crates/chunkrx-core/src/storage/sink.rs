//! Sinks: where the assembled stream ends up.

use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{temp_path, OutputFileBuilder};
use crate::error::SinkError;

/// Single-shot durable output. `write_all` receives the verified chunks in
/// arrival order and writes their concatenation as one logical output.
pub trait Sink {
    /// Returns the number of bytes written.
    fn write_all(&mut self, chunks: &[Bytes]) -> Result<u64, SinkError>;
}

impl<T: Sink + ?Sized> Sink for &mut T {
    fn write_all(&mut self, chunks: &[Bytes]) -> Result<u64, SinkError> {
        (**self).write_all(chunks)
    }
}

/// Creates or replaces a file via `.part` + rename.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    written: bool,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write_all(&mut self, chunks: &[Bytes]) -> Result<u64, SinkError> {
        if self.written {
            return Err(SinkError::AlreadyWritten);
        }
        self.written = true;

        let total: u64 = chunks.iter().map(|c| c.len() as u64).sum();
        let mut builder = OutputFileBuilder::create(&temp_path(&self.path))?;
        let mut writer = match builder.preallocate(total) {
            Ok(()) => builder.build(),
            Err(e) => {
                builder.build().discard();
                return Err(e);
            }
        };
        for chunk in chunks {
            if let Err(e) = writer.append(chunk) {
                writer.discard();
                return Err(e);
            }
        }
        if let Err(e) = writer.sync() {
            writer.discard();
            return Err(e);
        }
        let tmp = writer.temp_path().to_path_buf();
        if let Err(e) = writer.finalize(&self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        tracing::debug!(path = %self.path.display(), bytes = total, "output written");
        Ok(total)
    }
}

/// Keeps the written bytes in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    pub(crate) data: Vec<u8>,
    pub(crate) writes: usize,
}

#[cfg(test)]
impl Sink for MemorySink {
    fn write_all(&mut self, chunks: &[Bytes]) -> Result<u64, SinkError> {
        if self.writes > 0 {
            return Err(SinkError::AlreadyWritten);
        }
        self.writes += 1;
        for chunk in chunks {
            self.data.extend_from_slice(chunk);
        }
        Ok(self.data.len() as u64)
    }
}
