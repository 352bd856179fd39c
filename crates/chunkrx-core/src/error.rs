//! Error types for the receive session.
//!
//! Fatal conditions (`TransportError`, `SinkError`) end a session and reach
//! the caller as `ReceiveError`. Per-chunk problems are `ChunkFault` values:
//! they are counted and logged but never returned as `Err`.

use std::path::PathBuf;
use std::time::Duration;

/// The message channel is unusable. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to start transport runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: zeromq::ZmqError,
    },
    #[error("bind to {endpoint} failed: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: zeromq::ZmqError,
    },
    #[error("receive failed: {0}")]
    Recv(#[source] zeromq::ZmqError),
    #[error("send failed: {0}")]
    Send(#[source] zeromq::ZmqError),
    #[error("no message within {0:?}")]
    Timeout(Duration),
    #[error("no peer connected within {0:?}")]
    NoPeer(Duration),
    #[error("cannot send an empty frame-set")]
    EmptyFrameSet,
    #[error("transport closed")]
    Closed,
}

/// The output file could not be produced. Always fatal; unwritten data is lost.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to preallocate {size} bytes for {}: {source}", .path.display())]
    Preallocate {
        path: PathBuf,
        size: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to sync {}: {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sink already written")]
    AlreadyWritten,
}

/// Fatal error that aborted a receive session.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("sink failure: {0}")]
    Sink(#[from] SinkError),
}

/// Fatal error that aborted a send.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("chunk size must be positive")]
    ZeroChunkSize,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Recoverable problem with a single frame-set. The frame-set is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChunkFault {
    /// Neither a termination message nor a two-frame chunk.
    #[error("unexpected frame count {frame_count}")]
    Framing { frame_count: usize },
    /// Checksum frame is not exactly 8 bytes.
    #[error("checksum frame is {len} bytes, expected 8")]
    ChecksumWidth { len: usize },
    /// Declared checksum does not match the payload.
    #[error("checksum mismatch: declared {declared:016x}, computed {computed:016x}")]
    IntegrityMismatch { declared: u64, computed: u64 },
}

impl ChunkFault {
    /// Framing faults and integrity faults are counted separately in the session report.
    pub fn is_framing(&self) -> bool {
        matches!(self, ChunkFault::Framing { .. } | ChunkFault::ChecksumWidth { .. })
    }
}
