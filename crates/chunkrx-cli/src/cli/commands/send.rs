//! `chunkrx send` – stream a file to a receiver.

use anyhow::{Context, Result};
use chunkrx_core::config::ChunkrxConfig;
use chunkrx_core::digest::DigestKind;
use chunkrx_core::sender;
use chunkrx_core::transport::ZmqPush;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct SendOptions {
    pub bind: Option<String>,
    pub chunk_size: Option<usize>,
    pub peer_wait_secs: Option<u64>,
    pub digest: Option<DigestKind>,
    pub token: Option<String>,
}

pub fn run_send(cfg: &ChunkrxConfig, path: &Path, opts: SendOptions) -> Result<()> {
    let sender_cfg = cfg.sender();
    let bind = opts.bind.unwrap_or(sender_cfg.bind);
    let chunk_size = opts.chunk_size.unwrap_or(sender_cfg.chunk_size_bytes);
    let peer_wait = opts
        .peer_wait_secs
        .or(sender_cfg.peer_wait_secs)
        .map(Duration::from_secs);
    let digest = opts.digest.unwrap_or(cfg.digest).build();
    let token = opts.token.unwrap_or_else(|| cfg.termination_token.clone());

    let mut push = ZmqPush::bind(&bind)
        .with_context(|| format!("bind {}", bind))?
        .with_peer_wait(peer_wait);
    println!("Bound {}, waiting for a receiver...", push.endpoint());

    let report = sender::send_file(path, chunk_size, &mut push, &*digest, token.as_bytes())?;

    println!(
        "Sent {} chunk(s), {:.2} MiB in {:.2} s",
        report.chunks,
        report.bytes as f64 / 1_048_576.0,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
