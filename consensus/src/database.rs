use std::{
    fs,
    io::{ErrorKind, Write},
    path::PathBuf,
};

use alloy::primitives::B256;
use eyre::Result;
use tracing::{debug, warn};

use common::utils::bytes_to_b256;
use config::Config;

/// Length of a checkpoint block root.
pub const CHECKPOINT_LEN: usize = 32;

pub trait Database {
    fn new(config: &Config) -> Result<Self>
    where
        Self: Sized;

    fn save_checkpoint(&self, checkpoint: &[u8]) -> Result<()>;
    fn load_checkpoint(&self) -> Result<Vec<u8>>;

    fn checkpoint_root(&self) -> Result<B256> {
        let checkpoint = self.load_checkpoint()?;
        Ok(bytes_to_b256(&checkpoint)?)
    }
}

/// Persists the latest checkpoint to `<data_dir>/checkpoint`.
#[derive(Debug, Clone)]
pub struct FileDB {
    data_dir: PathBuf,
    default_checkpoint: Vec<u8>,
}

impl FileDB {
    fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join("checkpoint")
    }
}

impl Database for FileDB {
    fn new(config: &Config) -> Result<Self> {
        if let Some(data_dir) = &config.data_dir {
            return Ok(FileDB {
                data_dir: data_dir.to_path_buf(),
                default_checkpoint: config.default_checkpoint.clone(),
            });
        }

        eyre::bail!("data dir not in config")
    }

    fn save_checkpoint(&self, checkpoint: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let mut f = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.checkpoint_path())?;

        f.write_all(checkpoint)?;
        debug!(target: "selene::consensus", "saved checkpoint to {:?}", self.data_dir);

        Ok(())
    }

    /// Falls back to the configured default only when no well-formed
    /// checkpoint is on disk. Other I/O failures are returned.
    fn load_checkpoint(&self) -> Result<Vec<u8>> {
        match fs::read(self.checkpoint_path()) {
            Ok(buf) if buf.len() == CHECKPOINT_LEN => Ok(buf),
            Ok(buf) => {
                warn!(
                    target: "selene::consensus",
                    "ignoring stored checkpoint of length {}, using default",
                    buf.len()
                );
                Ok(self.default_checkpoint.clone())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(target: "selene::consensus", "no stored checkpoint, using default");
                Ok(self.default_checkpoint.clone())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Serves the checkpoint from the config and never persists anything.
#[derive(Debug, Clone)]
pub struct ConfigDB {
    checkpoint: Vec<u8>,
}

impl Database for ConfigDB {
    fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            checkpoint: config.checkpoint().to_vec(),
        })
    }

    fn load_checkpoint(&self) -> Result<Vec<u8>> {
        Ok(self.checkpoint.clone())
    }

    fn save_checkpoint(&self, _checkpoint: &[u8]) -> Result<()> {
        Ok(())
    }
}
