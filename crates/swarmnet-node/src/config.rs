//! Node configuration (§6 External Interfaces): chain RPC endpoint, subnet
//! path, key file, and bootstrap peers, loadable from `config.toml` and
//! overridable by the environment variables the spec names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub chain: ChainConfig,
    pub overlay: OverlayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path this subnet is registered under on-chain (§3 `SubnetDescriptor.path`).
    pub subnet_path: String,

    /// Peer identity key file (§6): protobuf `{key_type, data}`, 0400 perms.
    pub key_file_path: PathBuf,

    /// The super-majority threshold (basis points) the chain requires for
    /// reward finalization (§4.6, §9 — "must be confirmed against the
    /// on-chain runtime constant").
    #[serde(default = "default_ratification_threshold_bps")]
    pub ratification_threshold_bps: u32,

    /// Enable the optional block+RPS-weighted scoring mode (§4.4).
    #[serde(default)]
    pub rps_weighted_scoring: bool,

    /// Number of transformer blocks the model defines (§4.2, §4.3 `num_blocks`).
    /// The model definition itself is out of scope (§1); this is the one
    /// locally-known constant the core needs from it.
    pub num_blocks: u32,
}

fn default_ratification_threshold_bps() -> u32 {
    swarmnet_core::constants::DEFAULT_RATIFICATION_THRESHOLD_BPS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain JSON-RPC endpoint. Overridden by `LOCAL_RPC`/`DEV_RPC` (§6).
    pub rpc_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// DHT key prefix for this subnet's block-uids (§4.2: `{dht_prefix}.{i}`).
    pub dht_prefix: String,

    /// Bootstrap multiaddrs. If empty, falls back to `tmp/subnet-initial-peers` (§6).
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                subnet_path: "swarm/7b".to_string(),
                key_file_path: PathBuf::from("node.key"),
                ratification_threshold_bps: default_ratification_threshold_bps(),
                rps_weighted_scoring: false,
                num_blocks: 32,
            },
            chain: ChainConfig { rpc_url: "http://127.0.0.1:9944".to_string() },
            overlay: OverlayConfig { dht_prefix: "swarm.7b.layer".to_string(), bootstrap_peers: vec![] },
            logging: LoggingConfig { level: "info".to_string() },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `LOCAL_RPC`/`DEV_RPC` override `chain.rpc_url` (§6); `DEV_RPC` wins if
    /// both are set, matching the source's dev-takes-precedence convention.
    fn apply_env_overrides(&mut self) {
        if let Ok(local) = std::env::var("LOCAL_RPC") {
            self.chain.rpc_url = local;
        }
        if let Ok(dev) = std::env::var("DEV_RPC") {
            self.chain.rpc_url = dev;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node.subnet_path.is_empty() {
            anyhow::bail!("node.subnet_path must not be empty");
        }
        if self.node.ratification_threshold_bps == 0 || self.node.ratification_threshold_bps > 10_000 {
            anyhow::bail!(
                "node.ratification_threshold_bps must be in (0, 10000], got {}",
                self.node.ratification_threshold_bps
            );
        }
        if self.chain.rpc_url.is_empty() {
            anyhow::bail!("chain.rpc_url must not be empty");
        }
        if self.node.num_blocks == 0 {
            anyhow::bail!("node.num_blocks must be greater than zero");
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("invalid log level: {}", self.logging.level);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_ratification_threshold() {
        let mut config = Config::default();
        config.node.ratification_threshold_bps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_subnet_path() {
        let mut config = Config::default();
        config.node.subnet_path = String::new();
        assert!(config.validate().is_err());
    }
}
