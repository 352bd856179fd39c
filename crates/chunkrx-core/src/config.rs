use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::digest::DigestKind;

/// Sender parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Address the PUSH socket binds to.
    pub bind: String,
    /// Bytes read from the input file per chunk.
    pub chunk_size_bytes: usize,
    /// How long to wait for a receiver to connect before giving up (None = forever).
    #[serde(default)]
    pub peer_wait_secs: Option<u64>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            bind: "tcp://0.0.0.0:5555".to_string(),
            chunk_size_bytes: 64 * 1024 * 1024,
            peer_wait_secs: None,
        }
    }
}

/// How verified chunks reach the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Hold verified chunks in memory and write them once at end of stream.
    #[default]
    Buffered,
    /// Append each verified chunk to the temp file as soon as it is verified.
    WriteThrough,
}

/// Global configuration loaded from `~/.config/chunkrx/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkrxConfig {
    /// Address the receiver's PULL socket connects to.
    pub endpoint: String,
    /// Where the assembled stream is written.
    pub output_path: PathBuf,
    /// Single-frame message that ends the stream.
    pub termination_token: String,
    /// Checksum algorithm; must match the sender.
    #[serde(default)]
    pub digest: DigestKind,
    /// Buffered (default) or write-through.
    #[serde(default)]
    pub write_mode: Option<WriteMode>,
    /// Per-receive deadline in seconds (None = block until the sender speaks).
    #[serde(default)]
    pub recv_timeout_secs: Option<u64>,
    /// Optional sender settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub sender: Option<SenderConfig>,
}

impl Default for ChunkrxConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://127.0.0.1:5555".to_string(),
            output_path: PathBuf::from("received_output.bin"),
            termination_token: "END".to_string(),
            digest: DigestKind::default(),
            write_mode: None,
            recv_timeout_secs: None,
            sender: None,
        }
    }
}

impl ChunkrxConfig {
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode.unwrap_or_default()
    }

    pub fn sender(&self) -> SenderConfig {
        self.sender.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkrx")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkrxConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkrxConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkrxConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ChunkrxConfig::default();
        assert_eq!(cfg.endpoint, "tcp://127.0.0.1:5555");
        assert_eq!(cfg.output_path, PathBuf::from("received_output.bin"));
        assert_eq!(cfg.termination_token, "END");
        assert_eq!(cfg.digest, DigestKind::Xxh64);
        assert_eq!(cfg.write_mode(), WriteMode::Buffered);
        assert!(cfg.recv_timeout_secs.is_none());
        assert_eq!(cfg.sender().chunk_size_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ChunkrxConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ChunkrxConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.output_path, cfg.output_path);
        assert_eq!(parsed.termination_token, cfg.termination_token);
        assert_eq!(parsed.digest, cfg.digest);
    }

    #[test]
    fn config_toml_minimal() {
        let toml = r#"
            endpoint = "tcp://10.0.0.2:6000"
            output_path = "/tmp/out.bin"
            termination_token = "STOP"
        "#;
        let cfg: ChunkrxConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.endpoint, "tcp://10.0.0.2:6000");
        assert_eq!(cfg.termination_token, "STOP");
        assert_eq!(cfg.digest, DigestKind::Xxh64);
        assert!(cfg.write_mode.is_none());
        assert!(cfg.sender.is_none());
    }

    #[test]
    fn config_toml_write_mode_and_sender() {
        let toml = r#"
            endpoint = "tcp://127.0.0.1:5555"
            output_path = "out.bin"
            termination_token = "END"
            digest = "sha256"
            write_mode = "write-through"
            recv_timeout_secs = 30

            [sender]
            bind = "tcp://127.0.0.1:7000"
            chunk_size_bytes = 1_048_576
        "#;
        let cfg: ChunkrxConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.digest, DigestKind::Sha256);
        assert_eq!(cfg.write_mode(), WriteMode::WriteThrough);
        assert_eq!(cfg.recv_timeout_secs, Some(30));
        let sender = cfg.sender();
        assert_eq!(sender.bind, "tcp://127.0.0.1:7000");
        assert_eq!(sender.chunk_size_bytes, 1_048_576);
        assert!(sender.peer_wait_secs.is_none());
    }
}
