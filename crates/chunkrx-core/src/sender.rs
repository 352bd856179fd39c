//! File sender: the counterpart the receiver is built for.
//!
//! Reads a file sequentially in fixed-size chunks and sends each one as
//! `[chunk, checksum_le]`, followed by the single-frame termination token.

use bytes::Bytes;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::digest::{read_chunk, ChunkDigest};
use crate::error::SendError;
use crate::transport::{FrameSet, FrameSink};

/// Summary of one finished send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub chunks: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Stream `path` to `sink` in `chunk_size` pieces, then send `token`.
pub fn send_file<K>(
    path: &Path,
    chunk_size: usize,
    sink: &mut K,
    digest: &dyn ChunkDigest,
    token: &[u8],
) -> Result<SendReport, SendError>
where
    K: FrameSink + ?Sized,
{
    if chunk_size == 0 {
        return Err(SendError::ZeroChunkSize);
    }
    let input_err = |source| SendError::Input {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(input_err)?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    tracing::info!(path = %path.display(), size, chunk_size, digest = digest.name(), "sending file");

    let started = Instant::now();
    let mut chunks = 0u64;
    let mut bytes = 0u64;
    loop {
        let buf = read_chunk(&mut file, chunk_size).map_err(input_err)?;
        let n = buf.len();
        if n == 0 {
            break;
        }

        let hash_started = Instant::now();
        let checksum = digest.digest(&buf);
        let hash_ms = hash_started.elapsed().as_secs_f64() * 1000.0;

        sink.send(FrameSet::chunk(Bytes::from(buf), checksum))?;
        tracing::info!(
            chunk = chunks,
            size = n,
            hash_ms = %format!("{:.2}", hash_ms),
            checksum = %format!("{:016x}", checksum),
            "chunk sent"
        );
        chunks += 1;
        bytes += n as u64;
        if n < chunk_size {
            break;
        }
    }

    sink.send(FrameSet::single(Bytes::copy_from_slice(token)))?;
    let report = SendReport {
        chunks,
        bytes,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        chunks = report.chunks,
        bytes = report.bytes,
        secs = %format!("{:.2}", report.elapsed.as_secs_f64()),
        "termination token sent"
    );
    Ok(report)
}
