use std::time::{Duration, Instant};

use super::classify::{classify, Classification};
use super::store::ChunkStore;
use crate::digest::ChunkDigest;
use crate::error::{ChunkFault, ReceiveError, SinkError};
use crate::transport::{FrameSet, FrameSource};

/// Token the reference sender uses to end a stream.
pub const DEFAULT_TERMINATION_TOKEN: &str = "END";

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Running,
    Terminated,
}

/// Summary of one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Frame-sets handled as data, including skipped ones. The termination message is not counted.
    pub processed: u64,
    pub verified: u64,
    pub mismatched: u64,
    pub malformed: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// Per-session state machine. Counters cover everything except the termination message.
#[derive(Debug)]
pub struct Session {
    state: ReceiverState,
    processed: u64,
    mismatched: u64,
    malformed: u64,
    started: Instant,
    elapsed: Option<Duration>,
}

impl Default for Session {
    fn default() -> Self {
        Self::start()
    }
}

impl Session {
    pub fn start() -> Self {
        Self {
            state: ReceiverState::Running,
            processed: 0,
            mismatched: 0,
            malformed: 0,
            started: Instant::now(),
            elapsed: None,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn mismatched(&self) -> u64 {
        self.mismatched
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Handle one frame-set. Verified payloads are moved into `store`.
    ///
    /// Once terminated, further frame-sets are ignored and reported as `Terminated`.
    /// Only a store failure is an error.
    pub fn step<S: ChunkStore + ?Sized>(
        &mut self,
        frames: FrameSet,
        token: &[u8],
        digest: &dyn ChunkDigest,
        store: &mut S,
    ) -> Result<Classification, SinkError> {
        if self.state == ReceiverState::Terminated {
            return Ok(Classification::Terminated);
        }

        let index = self.processed;
        let outcome = classify(&frames, token, digest);
        match outcome {
            Classification::Terminated => {
                self.state = ReceiverState::Terminated;
                self.elapsed = Some(self.started.elapsed());
                tracing::info!(after = index, "termination token received");
                return Ok(outcome);
            }
            Classification::Verified { checksum } => {
                let payload = frames.into_frames().swap_remove(0);
                tracing::info!(
                    chunk = index,
                    size = payload.len(),
                    mib = %format!("{:.2}", payload.len() as f64 / MIB),
                    declared = %format!("{:016x}", checksum),
                    computed = %format!("{:016x}", checksum),
                    "chunk verified"
                );
                store.accept(payload)?;
            }
            Classification::Rejected(fault) => {
                if fault.is_framing() {
                    self.malformed += 1;
                } else {
                    self.mismatched += 1;
                }
                log_rejected(index, &frames, fault);
            }
        }
        self.processed += 1;
        Ok(outcome)
    }

    /// Session duration: frozen at termination, running otherwise.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }
}

fn log_rejected(index: u64, frames: &FrameSet, fault: ChunkFault) {
    match fault {
        ChunkFault::IntegrityMismatch { declared, computed } => {
            let size = frames.frames().first().map(|f| f.len()).unwrap_or(0);
            tracing::warn!(
                chunk = index,
                size,
                mib = %format!("{:.2}", size as f64 / MIB),
                declared = %format!("{:016x}", declared),
                computed = %format!("{:016x}", computed),
                "chunk not written: checksum mismatch"
            );
        }
        ChunkFault::Framing { .. } | ChunkFault::ChecksumWidth { .. } => {
            tracing::warn!(
                chunk = index,
                frames = frames.len(),
                reason = %fault,
                "unexpected message structure, skipped"
            );
        }
    }
}

/// Runs receive sessions against a fixed digest and termination token.
#[derive(Debug, Clone)]
pub struct StreamReceiver<D> {
    digest: D,
    token: Vec<u8>,
}

impl<D: ChunkDigest> StreamReceiver<D> {
    pub fn new(digest: D) -> Self {
        Self {
            digest,
            token: DEFAULT_TERMINATION_TOKEN.as_bytes().to_vec(),
        }
    }

    pub fn with_token(mut self, token: impl Into<Vec<u8>>) -> Self {
        self.token = token.into();
        self
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// Receive until the termination message, then flush `store` exactly once.
    ///
    /// Transport failures abort the session without any output. A store failure
    /// is reported after the summary is logged.
    pub fn run<Src, St>(&self, source: &mut Src, mut store: St) -> Result<SessionReport, ReceiveError>
    where
        Src: FrameSource + ?Sized,
        St: ChunkStore,
    {
        let mut session = Session::start();
        tracing::info!(digest = self.digest.name(), "receiver ready, waiting for chunks");

        while session.state() == ReceiverState::Running {
            let frames = match source.receive() {
                Ok(frames) => frames,
                Err(e) => {
                    tracing::error!(error = %e, processed = session.processed(), "transport failure");
                    store.abort();
                    return Err(e.into());
                }
            };
            if let Err(e) = session.step(frames, &self.token, &self.digest, &mut store) {
                tracing::error!(error = %e, processed = session.processed(), "write failed");
                store.abort();
                return Err(e.into());
            }
        }

        let verified = store.chunk_count();
        let finished = store.finish();
        let report = SessionReport {
            processed: session.processed(),
            verified,
            mismatched: session.mismatched(),
            malformed: session.malformed(),
            bytes_written: *finished.as_ref().unwrap_or(&0),
            elapsed: session.elapsed(),
        };
        tracing::info!(
            processed = report.processed,
            verified = report.verified,
            mismatched = report.mismatched,
            malformed = report.malformed,
            bytes = report.bytes_written,
            secs = %format!("{:.2}", report.elapsed.as_secs_f64()),
            "session finished"
        );
        match finished {
            Ok(_) => Ok(report),
            Err(e) => {
                tracing::error!(error = %e, "output not written");
                Err(e.into())
            }
        }
    }
}
