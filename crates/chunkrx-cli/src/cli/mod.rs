//! CLI for the chunkrx stream receiver.

mod commands;

use anyhow::Result;
use chunkrx_core::config;
use chunkrx_core::digest::DigestKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_checksum, run_receive, run_send, ReceiveOptions, SendOptions};

/// Top-level CLI for chunkrx.
#[derive(Debug, Parser)]
#[command(name = "chunkrx")]
#[command(about = "chunkrx: receive a checksummed chunk stream over ZeroMQ", long_about = None)]
pub struct Cli {
    /// Log to stderr instead of the state-dir log file.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Receive a stream, verify each chunk and write the verified chunks to a file.
    Receive {
        /// Sender address to connect to (e.g. tcp://127.0.0.1:5555).
        #[arg(long)]
        endpoint: Option<String>,
        /// Output file; created or replaced when the stream ends.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Append verified chunks to disk as they arrive instead of buffering in memory.
        #[arg(long)]
        write_through: bool,
        /// Give up if no sender appears, or no message arrives, within this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Checksum algorithm (xxh64 or sha256); must match the sender.
        #[arg(long)]
        digest: Option<DigestKind>,
        /// Termination token.
        #[arg(long)]
        token: Option<String>,
    },

    /// Send a file as a checksummed chunk stream.
    Send {
        /// File to send.
        path: PathBuf,
        /// Address to bind (e.g. tcp://0.0.0.0:5555).
        #[arg(long)]
        bind: Option<String>,
        /// Chunk size in bytes.
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,
        /// Give up if no receiver connects within this many seconds.
        #[arg(long, value_name = "SECS")]
        peer_wait_secs: Option<u64>,
        /// Checksum algorithm (xxh64 or sha256).
        #[arg(long)]
        digest: Option<DigestKind>,
        /// Termination token.
        #[arg(long)]
        token: Option<String>,
    },

    /// Print per-chunk checksums and the SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
        /// Chunk size in bytes (default: sender chunk size from config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,
        /// Checksum algorithm (xxh64 or sha256).
        #[arg(long)]
        digest: Option<DigestKind>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Receive {
                endpoint,
                output,
                write_through,
                timeout_secs,
                digest,
                token,
            } => run_receive(
                &cfg,
                ReceiveOptions {
                    endpoint,
                    output,
                    write_through,
                    timeout_secs,
                    digest,
                    token,
                },
            )?,
            CliCommand::Send {
                path,
                bind,
                chunk_size,
                peer_wait_secs,
                digest,
                token,
            } => run_send(
                &cfg,
                &path,
                SendOptions {
                    bind,
                    chunk_size,
                    peer_wait_secs,
                    digest,
                    token,
                },
            )?,
            CliCommand::Checksum {
                path,
                chunk_size,
                digest,
            } => run_checksum(&cfg, &path, chunk_size, digest)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
