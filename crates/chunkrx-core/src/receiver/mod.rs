//! Stream receiver: classify, verify, accumulate, flush.
//!
//! Each frame-set pulled from the transport is classified purely from its
//! bytes (see [`classify`]). Verified payloads go to a [`ChunkStore`] in
//! arrival order; everything else is counted, logged and dropped. The single
//! termination message ends the loop and triggers the one flush to the sink.

mod classify;
mod session;
mod store;

pub use classify::{classify, Classification, CHECKSUM_LEN};
pub use session::{ReceiverState, Session, SessionReport, StreamReceiver, DEFAULT_TERMINATION_TOKEN};
pub use store::{Accumulator, BufferedStore, ChunkStore, WriteThroughStore};

#[cfg(test)]
mod tests;
