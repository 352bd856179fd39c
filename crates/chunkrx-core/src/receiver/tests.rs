use bytes::Bytes;

use super::*;
use crate::digest::{ChunkDigest, Xxh64};
use crate::error::{ChunkFault, ReceiveError, SinkError, TransportError};
use crate::storage::{FileSink, MemorySink, Sink};
use crate::transport::{FrameSet, FrameSource, VecSource};

fn good(payload: &'static [u8]) -> FrameSet {
    FrameSet::chunk(payload, Xxh64::default().digest(payload))
}

fn end() -> FrameSet {
    FrameSet::single("END")
}

fn run(frame_sets: Vec<FrameSet>) -> (Result<SessionReport, ReceiveError>, MemorySink) {
    let mut source = VecSource::new(frame_sets);
    let mut sink = MemorySink::default();
    let result = StreamReceiver::new(Xxh64::default()).run(&mut source, BufferedStore::new(&mut sink));
    (result, sink)
}

/// Sink that always fails.
struct BrokenSink;

impl Sink for BrokenSink {
    fn write_all(&mut self, _chunks: &[Bytes]) -> Result<u64, SinkError> {
        Err(SinkError::Write {
            path: "broken".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }
}

#[test]
fn classify_termination_token() {
    let d = Xxh64::default();
    assert_eq!(classify(&end(), b"END", &d), Classification::Terminated);
}

#[test]
fn classify_other_single_frame_is_malformed() {
    let d = Xxh64::default();
    assert_eq!(
        classify(&FrameSet::single("STOP"), b"END", &d),
        Classification::Rejected(ChunkFault::Framing { frame_count: 1 })
    );
    assert_eq!(
        classify(&FrameSet::default(), b"END", &d),
        Classification::Rejected(ChunkFault::Framing { frame_count: 0 })
    );
}

#[test]
fn classify_verified_and_mismatched() {
    let d = Xxh64::default();
    assert_eq!(
        classify(&good(b"AAAA"), b"END", &d),
        Classification::Verified {
            checksum: 0xcf40b5b72bc43e77
        }
    );
    assert_eq!(
        classify(&FrameSet::chunk(&b"BBBB"[..], 0), b"END", &d),
        Classification::Rejected(ChunkFault::IntegrityMismatch {
            declared: 0,
            computed: d.digest(b"BBBB"),
        })
    );
}

#[test]
fn classify_wrong_checksum_width() {
    let d = Xxh64::default();
    let fs = FrameSet::new(vec![Bytes::from_static(b"AAAA"), Bytes::from_static(b"1234")]);
    assert_eq!(
        classify(&fs, b"END", &d),
        Classification::Rejected(ChunkFault::ChecksumWidth { len: 4 })
    );
}

#[test]
fn classify_token_inside_chunk_is_data() {
    let d = Xxh64::default();
    assert!(matches!(
        classify(&good(b"END"), b"END", &d),
        Classification::Verified { .. }
    ));
}

#[test]
fn classify_is_deterministic() {
    let d = Xxh64::default();
    let inputs = [
        good(b"AAAA"),
        FrameSet::chunk(&b"AAAA"[..], 1),
        end(),
        FrameSet::new(vec![Bytes::new(), Bytes::new(), Bytes::new()]),
    ];
    for fs in &inputs {
        let first = classify(fs, b"END", &d);
        for _ in 0..3 {
            assert_eq!(classify(fs, b"END", &d), first);
        }
    }
}

#[test]
fn verified_then_mismatched_writes_only_verified() {
    let (result, sink) = run(vec![good(b"AAAA"), FrameSet::chunk(&b"BBBB"[..], 0), end()]);
    let report = result.unwrap();
    assert_eq!(sink.data, b"AAAA");
    assert_eq!(sink.writes, 1);
    assert_eq!(report.processed, 2);
    assert_eq!(report.verified, 1);
    assert_eq!(report.mismatched, 1);
    assert_eq!(report.malformed, 0);
    assert_eq!(report.bytes_written, 4);
}

#[test]
fn immediate_end_is_empty_write() {
    let (result, sink) = run(vec![end()]);
    let report = result.unwrap();
    assert!(sink.data.is_empty());
    assert_eq!(sink.writes, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(report.verified, 0);
}

#[test]
fn three_frame_message_is_skipped() {
    let three = FrameSet::new(vec![
        Bytes::from_static(b"x"),
        Bytes::from_static(b"y"),
        Bytes::from_static(b"z"),
    ]);
    let (result, sink) = run(vec![good(b"one-"), three, good(b"two"), end()]);
    let report = result.unwrap();
    assert_eq!(sink.data, b"one-two");
    assert_eq!(report.processed, 3);
    assert_eq!(report.verified, 2);
    assert_eq!(report.malformed, 1);
}

#[test]
fn many_chunks_keep_arrival_order() {
    let payloads: Vec<Vec<u8>> = (0u8..50).map(|i| vec![i; (i as usize % 7) + 1]).collect();
    let d = Xxh64::default();
    let mut frame_sets: Vec<FrameSet> = payloads
        .iter()
        .map(|p| FrameSet::chunk(p.clone(), d.digest(p)))
        .collect();
    frame_sets.push(end());
    let (result, sink) = run(frame_sets);
    assert_eq!(result.unwrap().verified, 50);
    assert_eq!(sink.data, payloads.concat());
}

#[test]
fn frames_after_end_are_not_received() {
    let mut source = VecSource::new(vec![good(b"AAAA"), end(), good(b"late")]);
    let mut sink = MemorySink::default();
    StreamReceiver::new(Xxh64::default())
        .run(&mut source, BufferedStore::new(&mut sink))
        .unwrap();
    assert_eq!(source.remaining(), 1);
    assert_eq!(sink.data, b"AAAA");
}

#[test]
fn custom_token() {
    let mut source = VecSource::new(vec![good(b"AAAA"), end(), FrameSet::single("FIN")]);
    let mut sink = MemorySink::default();
    let report = StreamReceiver::new(Xxh64::default())
        .with_token("FIN")
        .run(&mut source, BufferedStore::new(&mut sink))
        .unwrap();
    // "END" is just a malformed single frame here.
    assert_eq!(report.malformed, 1);
    assert_eq!(sink.data, b"AAAA");
}

#[test]
fn transport_failure_aborts_without_write() {
    // No termination token: the source runs dry.
    let (result, sink) = run(vec![good(b"AAAA")]);
    assert!(matches!(
        result,
        Err(ReceiveError::Transport(TransportError::Closed))
    ));
    assert_eq!(sink.writes, 0);
}

#[test]
fn sink_failure_is_fatal() {
    let mut source = VecSource::new(vec![good(b"AAAA"), end()]);
    let result = StreamReceiver::new(Xxh64::default()).run(&mut source, BufferedStore::new(BrokenSink));
    assert!(matches!(result, Err(ReceiveError::Sink(SinkError::Write { .. }))));
}

#[test]
fn session_step_counts_and_terminates() {
    let d = Xxh64::default();
    let mut store = BufferedStore::new(MemorySink::default());
    let mut session = Session::start();

    session.step(good(b"AAAA"), b"END", &d, &mut store).unwrap();
    session.step(FrameSet::single("noise"), b"END", &d, &mut store).unwrap();
    assert_eq!(session.state(), ReceiverState::Running);
    assert_eq!(session.processed(), 2);
    assert_eq!(session.malformed(), 1);

    let c = session.step(end(), b"END", &d, &mut store).unwrap();
    assert_eq!(c, Classification::Terminated);
    assert_eq!(session.state(), ReceiverState::Terminated);
    assert_eq!(session.processed(), 2);

    // Ignored once terminated.
    session.step(good(b"late"), b"END", &d, &mut store).unwrap();
    assert_eq!(session.processed(), 2);
    assert_eq!(store.accumulator().to_vec(), b"AAAA");
    assert_eq!(store.chunk_count(), 1);
}

#[test]
fn write_through_store_matches_buffered_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("stream.bin");
    let mut source = VecSource::new(vec![
        good(b"AAAA"),
        FrameSet::chunk(&b"BBBB"[..], 0),
        good(b"CC"),
        end(),
    ]);
    let store = WriteThroughStore::create(&out).unwrap();
    let report = StreamReceiver::new(Xxh64::default())
        .run(&mut source, store)
        .unwrap();
    assert_eq!(report.verified, 2);
    assert_eq!(report.bytes_written, 6);
    assert_eq!(std::fs::read(&out).unwrap(), b"AAAACC");
    assert!(!crate::storage::temp_path(&out).exists());
}

#[test]
fn write_through_transport_failure_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("stream.bin");
    let mut source = VecSource::new(vec![good(b"AAAA")]);
    let store = WriteThroughStore::create(&out).unwrap();
    let result = StreamReceiver::new(Xxh64::default()).run(&mut source, store);
    assert!(result.is_err());
    assert!(!out.exists());
    assert!(!crate::storage::temp_path(&out).exists());
}

#[test]
fn buffered_file_sink_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("received_output.bin");
    let mut source = VecSource::new(vec![good(b"hello "), good(b"world"), end()]);
    let report = StreamReceiver::new(Xxh64::default())
        .run(&mut source, BufferedStore::new(FileSink::new(&out)))
        .unwrap();
    assert_eq!(report.bytes_written, 11);
    assert_eq!(std::fs::read(&out).unwrap(), b"hello world");
}

#[test]
fn boxed_digest_from_config() {
    let digest = crate::digest::DigestKind::Sha256.build();
    let payload = b"payload";
    let sum = digest.digest(payload);
    let mut source = VecSource::new(vec![FrameSet::chunk(&payload[..], sum), end()]);
    let mut sink = MemorySink::default();
    let report = StreamReceiver::new(digest)
        .run(&mut source, BufferedStore::new(&mut sink))
        .unwrap();
    assert_eq!(report.verified, 1);
    assert_eq!(sink.data, payload);
}

#[test]
fn source_trait_object_works() {
    let mut source = VecSource::new(vec![end()]);
    let dyn_source: &mut dyn FrameSource = &mut source;
    let report = StreamReceiver::new(Xxh64::default())
        .run(dyn_source, BufferedStore::new(MemorySink::default()))
        .unwrap();
    assert_eq!(report.processed, 0);
}

/// Store whose every `accept` fails; records which end-of-session hook ran.
struct FailingStore {
    aborted: std::rc::Rc<std::cell::Cell<bool>>,
    finished: std::rc::Rc<std::cell::Cell<bool>>,
}

impl ChunkStore for FailingStore {
    fn accept(&mut self, _chunk: Bytes) -> Result<(), SinkError> {
        Err(SinkError::Write {
            path: "stream.bin.part".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }

    fn chunk_count(&self) -> u64 {
        0
    }

    fn finish(self) -> Result<u64, SinkError> {
        self.finished.set(true);
        Ok(0)
    }

    fn abort(self) {
        self.aborted.set(true);
    }
}

#[test]
fn store_accept_failure_aborts_session() {
    let aborted = std::rc::Rc::new(std::cell::Cell::new(false));
    let finished = std::rc::Rc::new(std::cell::Cell::new(false));
    let store = FailingStore {
        aborted: aborted.clone(),
        finished: finished.clone(),
    };
    let mut source = VecSource::new(vec![good(b"AAAA"), good(b"BBBB"), end()]);
    let result = StreamReceiver::new(Xxh64::default()).run(&mut source, store);

    assert!(matches!(result, Err(ReceiveError::Sink(SinkError::Write { .. }))));
    assert!(aborted.get());
    assert!(!finished.get());
    assert_eq!(source.received(), 1);
    assert_eq!(source.remaining(), 2);
}
