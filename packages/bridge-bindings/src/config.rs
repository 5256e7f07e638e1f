//! Environment configuration for `bridgectl`

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::redact::Redacted;
use crate::watcher::WatcherConfig;

/// One side of the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainEndpoint {
    pub rpc_url: String,
    pub chain_id: u64,
    /// LockBridge on the source chain, MintBridge on the destination
    pub bridge_address: Option<Address>,
}

impl ChainEndpoint {
    pub fn require_bridge(&self) -> Result<Address> {
        self.bridge_address
            .ok_or_else(|| eyre!("No bridge address configured for chain {}", self.chain_id))
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub source: ChainEndpoint,
    pub destination: Option<ChainEndpoint>,
    pub private_key: Option<Redacted<String>>,
    pub artifacts_dir: PathBuf,
    #[serde(skip)]
    pub watcher: WatcherConfig,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("out")
}

fn artifacts_dir_from_env() -> PathBuf {
    optional("ARTIFACTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(default_artifacts_dir)
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} environment variable is required", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| eyre!("{} is invalid: {}", name, e))
}

fn optional_parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(name).map(|v| parse_var(name, &v)).transpose()
}

impl Config {
    /// Load configuration from environment variables
    /// Loads .env file if present, then reads from environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            dotenvy::from_path(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path.display()))?;
        }
        Self::from_env()
    }

    /// Artifacts directory alone, for commands that never touch a chain.
    ///
    /// Reads the .env file at `path` if present, like [`Config::load_from_file`],
    /// but needs none of the chain variables.
    pub fn artifacts_dir_from_file(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.exists() {
            dotenvy::from_path(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path.display()))?;
        }
        Ok(artifacts_dir_from_env())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let source = ChainEndpoint {
            rpc_url: required("SOURCE_RPC_URL")?,
            chain_id: parse_var("SOURCE_CHAIN_ID", &required("SOURCE_CHAIN_ID")?)?,
            bridge_address: optional_parsed("LOCK_BRIDGE_ADDRESS")?,
        };

        let destination = match optional("DEST_RPC_URL") {
            Some(rpc_url) => Some(ChainEndpoint {
                rpc_url,
                chain_id: parse_var(
                    "DEST_CHAIN_ID",
                    &required("DEST_CHAIN_ID")
                        .wrap_err("DEST_CHAIN_ID is required when DEST_RPC_URL is set")?,
                )?,
                bridge_address: optional_parsed("MINT_BRIDGE_ADDRESS")?,
            }),
            None => None,
        };

        let defaults = WatcherConfig::default();
        let watcher = WatcherConfig {
            poll_interval: optional_parsed::<u64>("WATCH_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            confirmations: optional_parsed("WATCH_CONFIRMATIONS")?
                .unwrap_or(defaults.confirmations),
            max_block_range: optional_parsed("WATCH_MAX_BLOCK_RANGE")?
                .unwrap_or(defaults.max_block_range),
        };

        let config = Config {
            source,
            destination,
            private_key: optional("BRIDGE_PRIVATE_KEY").map(Redacted),
            artifacts_dir: artifacts_dir_from_env(),
            watcher,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.source.rpc_url.trim().is_empty() {
            return Err(eyre!("SOURCE_RPC_URL cannot be empty"));
        }

        if self.watcher.max_block_range == 0 {
            return Err(eyre!("WATCH_MAX_BLOCK_RANGE must be greater than 0"));
        }

        if let Some(key) = &self.private_key {
            let key = key.expose().trim();
            let hex = key.strip_prefix("0x").unwrap_or(key);
            if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(eyre!("BRIDGE_PRIVATE_KEY must be 32 bytes of hex"));
            }
        }

        if let Some(dest) = &self.destination {
            if dest.chain_id == self.source.chain_id {
                return Err(eyre!(
                    "DEST_CHAIN_ID {} must differ from SOURCE_CHAIN_ID",
                    dest.chain_id
                ));
            }
        }

        Ok(())
    }

    pub fn require_destination(&self) -> Result<&ChainEndpoint> {
        self.destination
            .as_ref()
            .ok_or_else(|| eyre!("DEST_RPC_URL is not configured"))
    }

    pub fn require_private_key(&self) -> Result<&str> {
        self.private_key
            .as_ref()
            .map(|k| k.expose().as_str())
            .ok_or_else(|| eyre!("BRIDGE_PRIVATE_KEY environment variable is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "SOURCE_RPC_URL",
        "SOURCE_CHAIN_ID",
        "LOCK_BRIDGE_ADDRESS",
        "DEST_RPC_URL",
        "DEST_CHAIN_ID",
        "MINT_BRIDGE_ADDRESS",
        "BRIDGE_PRIVATE_KEY",
        "ARTIFACTS_DIR",
        "WATCH_POLL_INTERVAL_MS",
        "WATCH_CONFIRMATIONS",
        "WATCH_MAX_BLOCK_RANGE",
    ];

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
        for name in ALL_VARS {
            env::remove_var(name);
        }
        for (name, value) in vars {
            env::set_var(name, value);
        }
        f();
        for name in ALL_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_minimal_config_uses_defaults() {
        with_env(
            &[("SOURCE_RPC_URL", "http://localhost:8545"), ("SOURCE_CHAIN_ID", "31337")],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.source.chain_id, 31337);
                assert!(config.source.bridge_address.is_none());
                assert!(config.destination.is_none());
                assert!(config.private_key.is_none());
                assert_eq!(config.artifacts_dir, PathBuf::from("out"));
                assert_eq!(config.watcher.poll_interval, Duration::from_secs(2));
                assert_eq!(config.watcher.confirmations, 1);
                assert_eq!(config.watcher.max_block_range, 10_000);
            },
        );
    }

    #[test]
    #[serial]
    fn test_full_config() {
        with_env(
            &[
                ("SOURCE_RPC_URL", "http://localhost:8545"),
                ("SOURCE_CHAIN_ID", "31337"),
                ("LOCK_BRIDGE_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
                ("DEST_RPC_URL", "http://localhost:8546"),
                ("DEST_CHAIN_ID", "31338"),
                ("MINT_BRIDGE_ADDRESS", "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
                ("BRIDGE_PRIVATE_KEY", KEY),
                ("ARTIFACTS_DIR", "contracts/out"),
                ("WATCH_POLL_INTERVAL_MS", "500"),
                ("WATCH_CONFIRMATIONS", "3"),
                ("WATCH_MAX_BLOCK_RANGE", "2000"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.source.require_bridge().is_ok());
                let dest = config.require_destination().unwrap();
                assert_eq!(dest.chain_id, 31338);
                assert!(dest.bridge_address.is_some());
                assert_eq!(config.require_private_key().unwrap(), KEY);
                assert_eq!(config.artifacts_dir, PathBuf::from("contracts/out"));
                assert_eq!(config.watcher.poll_interval, Duration::from_millis(500));
                assert_eq!(config.watcher.confirmations, 3);
                assert_eq!(config.watcher.max_block_range, 2000);
            },
        );
    }

    #[test]
    #[serial]
    fn test_debug_redacts_private_key() {
        with_env(
            &[
                ("SOURCE_RPC_URL", "http://localhost:8545"),
                ("SOURCE_CHAIN_ID", "1"),
                ("BRIDGE_PRIVATE_KEY", KEY),
            ],
            || {
                let config = Config::from_env().unwrap();
                let debug = format!("{:?}", config);
                assert!(debug.contains("<redacted>"));
                assert!(!debug.contains("ac0974bec39a"));

                let json = serde_json::to_string(&config).unwrap();
                assert!(!json.contains("ac0974bec39a"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_required_vars() {
        with_env(&[("SOURCE_CHAIN_ID", "1")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("SOURCE_RPC_URL"));
        });

        with_env(
            &[
                ("SOURCE_RPC_URL", "http://localhost:8545"),
                ("SOURCE_CHAIN_ID", "1"),
                ("DEST_RPC_URL", "http://localhost:8546"),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(format!("{:#}", err).contains("DEST_CHAIN_ID"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        let base = [("SOURCE_RPC_URL", "http://localhost:8545"), ("SOURCE_CHAIN_ID", "1")];

        let mut vars = base.to_vec();
        vars.push(("LOCK_BRIDGE_ADDRESS", "0x1234"));
        with_env(&vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("LOCK_BRIDGE_ADDRESS"));
        });

        let mut vars = base.to_vec();
        vars.push(("WATCH_MAX_BLOCK_RANGE", "0"));
        with_env(&vars, || {
            assert!(Config::from_env().is_err());
        });

        let mut vars = base.to_vec();
        vars.push(("BRIDGE_PRIVATE_KEY", "0xdeadbeef"));
        with_env(&vars, || {
            assert!(Config::from_env().is_err());
        });

        with_env(&[("SOURCE_RPC_URL", "http://x"), ("SOURCE_CHAIN_ID", "abc")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("SOURCE_CHAIN_ID"));
        });
    }

    #[test]
    #[serial]
    fn test_load_from_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "SOURCE_RPC_URL=http://localhost:9545\nSOURCE_CHAIN_ID=56\n",
        )
        .unwrap();

        with_env(&[], || {
            let config = Config::load_from_file(&path).unwrap();
            assert_eq!(config.source.rpc_url, "http://localhost:9545");
            assert_eq!(config.source.chain_id, 56);
        });
    }

    #[test]
    #[serial]
    fn test_artifacts_dir_from_dotenv_without_chain_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ARTIFACTS_DIR=contracts/out\n").unwrap();

        with_env(&[], || {
            assert!(Config::from_env().is_err());
            assert_eq!(
                Config::artifacts_dir_from_file(&path).unwrap(),
                PathBuf::from("contracts/out")
            );
        });

        with_env(&[], || {
            let missing = dir.path().join("missing.env");
            assert_eq!(
                Config::artifacts_dir_from_file(&missing).unwrap(),
                PathBuf::from("out")
            );
        });
    }
}
