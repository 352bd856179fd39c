//! Where verified chunks go between verification and the end of the session.

use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::storage::{temp_path, OutputFileBuilder, OutputWriter, Sink};

/// Destination for verified chunks during one session.
pub trait ChunkStore {
    /// Take ownership of the next verified chunk (arrival order).
    fn accept(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    /// Verified chunks accepted so far.
    fn chunk_count(&self) -> u64;

    /// End of stream: make the output durable. Returns bytes written.
    fn finish(self) -> Result<u64, SinkError>
    where
        Self: Sized;

    /// Fatal error elsewhere: drop everything without producing output.
    fn abort(self)
    where
        Self: Sized;
}

/// Verified chunks in arrival order. Only ever grows.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    chunks: Vec<Bytes>,
    bytes: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        self.bytes += chunk.len() as u64;
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// The concatenation of all chunks.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes as usize);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

/// Holds everything in memory and hands it to the sink once, at the end.
pub struct BufferedStore<S> {
    accumulator: Accumulator,
    sink: S,
}

impl<S: Sink> BufferedStore<S> {
    pub fn new(sink: S) -> Self {
        Self {
            accumulator: Accumulator::new(),
            sink,
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }
}

impl<S: Sink> ChunkStore for BufferedStore<S> {
    fn accept(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.accumulator.push(chunk);
        Ok(())
    }

    fn chunk_count(&self) -> u64 {
        self.accumulator.len() as u64
    }

    fn finish(mut self) -> Result<u64, SinkError> {
        self.sink.write_all(self.accumulator.chunks())
    }

    fn abort(self) {
        tracing::debug!(
            chunks = self.accumulator.len(),
            bytes = self.accumulator.byte_len(),
            "discarding buffered chunks"
        );
    }
}

/// Appends each verified chunk to `<output>.part` immediately; memory use
/// stays at one chunk. The output path only appears on `finish`.
pub struct WriteThroughStore {
    writer: OutputWriter,
    final_path: PathBuf,
    chunks: u64,
}

impl WriteThroughStore {
    pub fn create(final_path: &Path) -> Result<Self, SinkError> {
        let writer = OutputFileBuilder::create(&temp_path(final_path))?.build();
        Ok(Self {
            writer,
            final_path: final_path.to_path_buf(),
            chunks: 0,
        })
    }
}

impl ChunkStore for WriteThroughStore {
    fn accept(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.writer.append(&chunk)?;
        self.chunks += 1;
        Ok(())
    }

    fn chunk_count(&self) -> u64 {
        self.chunks
    }

    fn finish(self) -> Result<u64, SinkError> {
        let written = self.writer.bytes_written();
        if let Err(e) = self.writer.sync() {
            self.writer.discard();
            return Err(e);
        }
        let tmp = self.writer.temp_path().to_path_buf();
        if let Err(e) = self.writer.finalize(&self.final_path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(written)
    }

    fn abort(self) {
        self.writer.discard();
    }
}
