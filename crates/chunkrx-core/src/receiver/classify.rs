use crate::digest::ChunkDigest;
use crate::error::ChunkFault;
use crate::transport::FrameSet;

/// Width of the declared checksum frame.
pub const CHECKSUM_LEN: usize = 8;

/// What a frame-set is, decided from its content alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Single frame equal to the termination token.
    Terminated,
    /// Two frames; declared checksum matches the payload.
    Verified { checksum: u64 },
    /// Skipped: wrong shape or checksum mismatch.
    Rejected(ChunkFault),
}

/// Classify one frame-set. Pure: the same bytes always give the same answer.
pub fn classify(frames: &FrameSet, token: &[u8], digest: &dyn ChunkDigest) -> Classification {
    match frames.frames() {
        [only] if &only[..] == token => Classification::Terminated,
        [payload, declared] => {
            let declared = match <[u8; CHECKSUM_LEN]>::try_from(&declared[..]) {
                Ok(raw) => raw,
                Err(_) => {
                    return Classification::Rejected(ChunkFault::ChecksumWidth {
                        len: declared.len(),
                    })
                }
            };
            let declared = u64::from_le_bytes(declared);
            let computed = digest.digest(payload);
            if declared == computed {
                Classification::Verified { checksum: computed }
            } else {
                Classification::Rejected(ChunkFault::IntegrityMismatch { declared, computed })
            }
        }
        other => Classification::Rejected(ChunkFault::Framing {
            frame_count: other.len(),
        }),
    }
}
