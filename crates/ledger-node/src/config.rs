// ledger-node/src/config.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use token_ledger::{BlacklistPolicy, LedgerSettings, DEFAULT_BURN_FEE_BPS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: String,
    pub token: TokenConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub decimals: u8,
    pub default_burn_fee_bps: u16,
    pub blacklist_policy: BlacklistPolicy,
    pub authority_bypasses_pause: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Relative to `data_dir`
    pub snapshot_file: String,
    /// Write a snapshot after every applied command
    pub persist_after_call: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            token: TokenConfig {
                decimals: 18,
                default_burn_fee_bps: DEFAULT_BURN_FEE_BPS,
                blacklist_policy: BlacklistPolicy::SenderOnly,
                authority_bypasses_pause: true,
            },
            storage: StorageConfig {
                snapshot_file: "ledger.json".into(),
                persist_after_call: true,
            },
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.storage.snapshot_file)
    }

    pub fn to_settings(&self) -> LedgerSettings {
        LedgerSettings {
            decimals: self.token.decimals,
            default_burn_fee_bps: self.token.default_burn_fee_bps,
            blacklist_policy: self.token.blacklist_policy,
            authority_bypasses_pause: self.token.authority_bypasses_pause,
        }
    }
}
