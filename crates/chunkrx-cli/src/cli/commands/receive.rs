//! `chunkrx receive` – run one receive session.

use anyhow::{Context, Result};
use chunkrx_core::config::{ChunkrxConfig, WriteMode};
use chunkrx_core::digest::DigestKind;
use chunkrx_core::receiver::{BufferedStore, SessionReport, StreamReceiver, WriteThroughStore};
use chunkrx_core::storage::FileSink;
use chunkrx_core::transport::ZmqPull;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line overrides; anything left `None` comes from config.
#[derive(Debug, Default)]
pub struct ReceiveOptions {
    pub endpoint: Option<String>,
    pub output: Option<PathBuf>,
    pub write_through: bool,
    pub timeout_secs: Option<u64>,
    pub digest: Option<DigestKind>,
    pub token: Option<String>,
}

pub fn run_receive(cfg: &ChunkrxConfig, opts: ReceiveOptions) -> Result<()> {
    let endpoint = opts.endpoint.unwrap_or_else(|| cfg.endpoint.clone());
    let output = opts.output.unwrap_or_else(|| cfg.output_path.clone());
    let mode = if opts.write_through {
        WriteMode::WriteThrough
    } else {
        cfg.write_mode()
    };
    let timeout = opts
        .timeout_secs
        .or(cfg.recv_timeout_secs)
        .map(Duration::from_secs);
    let digest = opts.digest.unwrap_or(cfg.digest);
    let token = opts.token.unwrap_or_else(|| cfg.termination_token.clone());

    // The timeout bounds the wait for a sender to appear as well as each receive.
    println!("Waiting for sender on {}...", endpoint);
    let mut pull = ZmqPull::connect_within(&endpoint, timeout)
        .with_context(|| format!("connect {}", endpoint))?
        .with_timeout(timeout);
    println!("Connected, waiting for chunks...");

    let receiver = StreamReceiver::new(digest.build()).with_token(token.into_bytes());
    let report = match mode {
        WriteMode::Buffered => {
            receiver.run(&mut pull, BufferedStore::new(FileSink::new(&output)))?
        }
        WriteMode::WriteThrough => {
            let store = WriteThroughStore::create(&output)?;
            receiver.run(&mut pull, store)?
        }
    };

    print_summary(&report, &output);
    Ok(())
}

fn print_summary(report: &SessionReport, output: &std::path::Path) {
    println!("End of stream received.");
    println!(
        "Chunks: {} processed, {} verified, {} mismatched, {} malformed",
        report.processed, report.verified, report.mismatched, report.malformed
    );
    println!(
        "Written: {:.2} MiB to {}",
        report.bytes_written as f64 / 1_048_576.0,
        output.display()
    );
    println!("Elapsed: {:.2} s", report.elapsed.as_secs_f64());
}
