//! `chunkrx checksum` – per-chunk digests plus whole-file SHA-256.

use anyhow::Result;
use chunkrx_core::config::ChunkrxConfig;
use chunkrx_core::digest::{self, DigestKind};
use std::path::Path;

pub fn run_checksum(
    cfg: &ChunkrxConfig,
    path: &Path,
    chunk_size: Option<usize>,
    kind: Option<DigestKind>,
) -> Result<()> {
    let chunk_size = chunk_size.unwrap_or_else(|| cfg.sender().chunk_size_bytes);
    let algo = kind.unwrap_or(cfg.digest).build();
    for c in digest::digest_path(path, &*algo, chunk_size)? {
        println!("{:>6}  {:>12}  {:016x}  {}", c.index, c.len, c.checksum, algo.name());
    }
    let sha = digest::sha256_path(path)?;
    println!("{}  {}", sha, path.display());
    Ok(())
}
