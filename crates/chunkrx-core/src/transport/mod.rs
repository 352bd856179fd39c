//! Message-oriented transport.
//!
//! The receiver pulls whole frame-sets (one ZeroMQ multipart message each)
//! through `FrameSource`; the sender pushes them through `FrameSink`. Both
//! are blocking. Frame count and bytes are delivered exactly as sent.

mod zmq;

pub use self::zmq::{ZmqPull, ZmqPush};

use bytes::Bytes;
use std::collections::VecDeque;

use crate::error::TransportError;

/// One atomically received message: an ordered list of opaque frames.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameSet(Vec<Bytes>);

impl FrameSet {
    pub fn new(frames: Vec<Bytes>) -> Self {
        Self(frames)
    }

    /// A one-frame message (used for the termination token).
    pub fn single(frame: impl Into<Bytes>) -> Self {
        Self(vec![frame.into()])
    }

    /// A data message: payload frame followed by the 8-byte little-endian checksum.
    pub fn chunk(payload: impl Into<Bytes>, checksum: u64) -> Self {
        Self(vec![
            payload.into(),
            Bytes::copy_from_slice(&checksum.to_le_bytes()),
        ])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> &[Bytes] {
        &self.0
    }

    pub fn into_frames(self) -> Vec<Bytes> {
        self.0
    }
}

impl From<Vec<Bytes>> for FrameSet {
    fn from(frames: Vec<Bytes>) -> Self {
        Self(frames)
    }
}

/// Blocking "receive next frame-set". Errors are fatal to the session.
pub trait FrameSource {
    fn receive(&mut self) -> Result<FrameSet, TransportError>;
}

/// Blocking "send one frame-set".
pub trait FrameSink {
    fn send(&mut self, frames: FrameSet) -> Result<(), TransportError>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn receive(&mut self) -> Result<FrameSet, TransportError> {
        (**self).receive()
    }
}

impl<T: FrameSink + ?Sized> FrameSink for &mut T {
    fn send(&mut self, frames: FrameSet) -> Result<(), TransportError> {
        (**self).send(frames)
    }
}

/// Replays a fixed list of frame-sets. Running dry is reported as `Closed`.
#[derive(Debug, Default)]
pub struct VecSource {
    queue: VecDeque<FrameSet>,
    received: usize,
}

impl VecSource {
    pub fn new(frame_sets: impl IntoIterator<Item = FrameSet>) -> Self {
        Self {
            queue: frame_sets.into_iter().collect(),
            received: 0,
        }
    }

    /// Number of frame-sets handed out so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Frame-sets not yet received.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl FrameSource for VecSource {
    fn receive(&mut self) -> Result<FrameSet, TransportError> {
        let next = self.queue.pop_front().ok_or(TransportError::Closed)?;
        self.received += 1;
        Ok(next)
    }
}

/// Collects sent frame-sets in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct VecSink {
    pub(crate) sent: Vec<FrameSet>,
}

#[cfg(test)]
impl FrameSink for VecSink {
    fn send(&mut self, frames: FrameSet) -> Result<(), TransportError> {
        if frames.is_empty() {
            return Err(TransportError::EmptyFrameSet);
        }
        self.sent.push(frames);
        Ok(())
    }
}
