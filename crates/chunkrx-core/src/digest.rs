//! Chunk checksums.
//!
//! The receiver only ever sees a `u64` per chunk; which algorithm produced it
//! is a deployment choice that must match the sender bit-for-bit. Declared
//! checksums travel little-endian on the wire.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// A deterministic, order-sensitive 64-bit digest over a byte slice.
pub trait ChunkDigest {
    fn digest(&self, bytes: &[u8]) -> u64;

    /// Short algorithm name for diagnostics.
    fn name(&self) -> &'static str;
}

impl<T: ChunkDigest + ?Sized> ChunkDigest for Box<T> {
    fn digest(&self, bytes: &[u8]) -> u64 {
        (**self).digest(bytes)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// XXH64, the reference algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh64 {
    pub seed: u64,
}

impl ChunkDigest for Xxh64 {
    fn digest(&self, bytes: &[u8]) -> u64 {
        xxhash_rust::xxh64::xxh64(bytes, self.seed)
    }

    fn name(&self) -> &'static str {
        "xxh64"
    }
}

/// First 8 bytes of SHA-256, read little-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Prefix;

impl ChunkDigest for Sha256Prefix {
    fn digest(&self, bytes: &[u8]) -> u64 {
        let full = Sha256::digest(bytes);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&full[..8]);
        u64::from_le_bytes(prefix)
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Algorithm selector used in config and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    #[default]
    Xxh64,
    Sha256,
}

impl DigestKind {
    pub fn build(self) -> Box<dyn ChunkDigest> {
        match self {
            DigestKind::Xxh64 => Box::new(Xxh64::default()),
            DigestKind::Sha256 => Box::new(Sha256Prefix),
        }
    }
}

impl std::str::FromStr for DigestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xxh64" => Ok(DigestKind::Xxh64),
            "sha256" => Ok(DigestKind::Sha256),
            other => Err(format!("unknown digest '{}' (expected xxh64 or sha256)", other)),
        }
    }
}

/// Digest of one chunk of a file, as a sender would frame it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkChecksum {
    pub index: u64,
    pub len: usize,
    pub checksum: u64,
}

/// Split `path` into `chunk_size` pieces and digest each one.
///
/// Chunk boundaries match `sender::send_file`, so the result can be compared
/// against the sender's diagnostics or against the receiver's output file.
pub fn digest_path(path: &Path, digest: &dyn ChunkDigest, chunk_size: usize) -> Result<Vec<ChunkChecksum>> {
    anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    loop {
        let buf = read_chunk(&mut f, chunk_size).with_context(|| format!("read {}", path.display()))?;
        let n = buf.len();
        if n == 0 {
            break;
        }
        out.push(ChunkChecksum {
            index: out.len() as u64,
            len: n,
            checksum: digest.digest(&buf),
        });
        if n < chunk_size {
            break;
        }
    }
    Ok(out)
}

/// Read up to `chunk_size` bytes; shorter only at EOF. The buffer grows with
/// what is actually read, so a chunk size larger than the file costs nothing.
pub(crate) fn read_chunk(r: &mut impl Read, chunk_size: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.by_ref().take(chunk_size as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}
