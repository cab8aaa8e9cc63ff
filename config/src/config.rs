use std::path::{Path, PathBuf};

use eyre::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use common::spec::SpecId;
use common::utils::{bytes_deserialize, bytes_opt_deserialize, bytes_opt_serialize, bytes_serialize};

/// Environment variables with this prefix override file values.
pub const ENV_PREFIX: &str = "SELENE_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    #[serde(
        deserialize_with = "bytes_deserialize",
        serialize_with = "bytes_serialize"
    )]
    pub default_checkpoint: Vec<u8>,
    #[serde(
        deserialize_with = "bytes_opt_deserialize",
        serialize_with = "bytes_opt_serialize"
    )]
    pub checkpoint: Option<Vec<u8>>,
    pub chain_id: u64,
    pub spec_id: SpecId,
    pub memory_limit: u64,
    pub disable_base_fee: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            default_checkpoint: vec![0; 32],
            checkpoint: None,
            chain_id: 1,
            spec_id: SpecId::default(),
            memory_limit: (1 << 32) - 1,
            disable_base_fee: false,
        }
    }
}

impl Config {
    /// Layers the defaults, the TOML file at `config_path` and `SELENE_*`
    /// environment variables, later sources winning.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config = Self::figment(config_path).extract()?;
        Ok(config)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// The checkpoint a light client should start from.
    pub fn checkpoint(&self) -> &[u8] {
        self.checkpoint
            .as_deref()
            .unwrap_or(self.default_checkpoint.as_slice())
    }
}
