//! Relay configuration loaded from environment variables or a JSON file.
//!
//! Required: `COORDINATOR_ADDRESS`
//! Optional: `RELAY_CONFIG_PATH`, `RPC_URL`, `CHAIN_ID`, `FROM_ADDRESSES`,
//!           `EFFECTIVE_TRANSMITTER_ADDRESS`, `GAS_LIMIT`, `CONTRACT_VERSION`,
//!           `COORDINATOR_VERSION`, `PLUGIN_TYPE`, `TX_QUEUE_SIZE`,
//!           `SIMULATE_TRANSMIT`
//!
//! `SIMULATE_TRANSMIT` takes `true` or `false`. Malformed values are errors.
//!
//! When `RELAY_CONFIG_PATH` is set the file is used and the other variables
//! are ignored.

use std::fmt::Display;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::client::{TransmitCheckerSpec, TransmitCheckerType, TxStrategy};
use crate::coordinator::CoordinatorVersion;
use crate::digester::PluginType;

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_id() -> u64 {
    1337
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_contract_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Ethereum JSON-RPC endpoint (HTTP).
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// The Functions coordinator (OCR2 aggregator) to watch.
    pub coordinator_address: Address,
    /// Sending keys the round-robin keystore picks from.
    #[serde(default)]
    pub from_addresses: Vec<Address>,
    /// Defaults to the first sending key.
    #[serde(default)]
    pub effective_transmitter_address: Option<Address>,
    /// Gas limit for `transmit` transactions.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_contract_version")]
    pub contract_version: u32,
    #[serde(default)]
    pub coordinator_version: CoordinatorVersion,
    #[serde(default)]
    pub plugin_type: PluginType,
    #[serde(default)]
    pub strategy: TxStrategy,
    #[serde(default)]
    pub checker: TransmitCheckerSpec,
}

impl RelayConfig {
    /// Loads `.env`, then the JSON file named by `RELAY_CONFIG_PATH` if set,
    /// otherwise the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        match std::env::var("RELAY_CONFIG_PATH") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Self::from_env(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let path = shellexpand::tilde(path).to_string();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read relay config from {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid relay config in {path}"))
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = var("RPC_URL").unwrap_or_else(default_rpc_url);
        let chain_id = parse_or(&var, "CHAIN_ID", default_chain_id())?;

        let coordinator_address = var("COORDINATOR_ADDRESS")
            .context("COORDINATOR_ADDRESS env var must be set")?;
        let coordinator_address = Address::from_str(coordinator_address.trim())
            .with_context(|| format!("invalid COORDINATOR_ADDRESS: {coordinator_address}"))?;

        let from_addresses = var("FROM_ADDRESSES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Address::from_str(s).with_context(|| format!("invalid FROM_ADDRESSES entry: {s}")))
            .collect::<Result<Vec<_>>>()?;

        let effective_transmitter_address = var("EFFECTIVE_TRANSMITTER_ADDRESS")
            .map(|s| {
                Address::from_str(s.trim())
                    .with_context(|| format!("invalid EFFECTIVE_TRANSMITTER_ADDRESS: {s}"))
            })
            .transpose()?;

        let gas_limit = parse_or(&var, "GAS_LIMIT", default_gas_limit())?;

        let contract_version = parse_or(&var, "CONTRACT_VERSION", default_contract_version())?;
        let coordinator_version = parse_or(&var, "COORDINATOR_VERSION", CoordinatorVersion::default())?;
        let plugin_type = parse_or(&var, "PLUGIN_TYPE", PluginType::default())?;

        let queue_size: u32 = parse_or(&var, "TX_QUEUE_SIZE", 0)?;
        let strategy = match queue_size {
            0 => TxStrategy::SendEvery,
            queue_size => TxStrategy::DropOldest { queue_size },
        };

        let simulate: bool = parse_or(&var, "SIMULATE_TRANSMIT", false)?;
        let checker = TransmitCheckerSpec {
            checker_type: if simulate {
                TransmitCheckerType::Simulate
            } else {
                TransmitCheckerType::None
            },
        };

        Ok(Self {
            rpc_url,
            chain_id,
            coordinator_address,
            from_addresses,
            effective_transmitter_address,
            gas_limit,
            contract_version,
            coordinator_version,
            plugin_type,
            strategy,
            checker,
        })
    }

    /// The configured transmitter, else the first sending key, else zero.
    pub fn effective_transmitter(&self) -> Address {
        self.effective_transmitter_address
            .or_else(|| self.from_addresses.first().copied())
            .unwrap_or(Address::ZERO)
    }

    pub fn chain_id(&self) -> U256 {
        U256::from(self.chain_id)
    }
}

/// Parses `key` when present, failing on malformed values.
fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} {raw:?}: {e}")),
        None => Ok(default),
    }
}
