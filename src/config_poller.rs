//! Tracks the latest OCR2 configuration of a coordinator through its
//! `ConfigSet` logs.
//!
//! The poller keeps no state of its own. Every call re-reads the log
//! poller, so results are only as fresh as the log poller's index.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use tracing::{debug, info};

use crate::bindings::OCR2Base::ConfigSet;
use crate::client::{Filter, LogPoller, LogPollerError};
use crate::digester::{PluginType, apply_digest_prefix};
use crate::error::{Error, Result};
use crate::service::Service;
use crate::types::{ContractConfig, Log};

const CONFIG_CONFIRMATIONS: u64 = 1;

pub fn config_poller_filter_name(address: Address) -> String {
    format!("OCR2ConfigPoller:{address}")
}

/// Decodes a `ConfigSet` log and stamps the plugin prefix onto its digest.
pub fn config_from_log(log: &Log, plugin_type: PluginType) -> Result<ContractConfig> {
    let event = ConfigSet::decode_raw_log(log.topics.iter().copied(), &log.data, true)?;

    let mut config_digest = event.configDigest;
    apply_digest_prefix(&mut config_digest, plugin_type.digest_prefix());

    Ok(ContractConfig {
        config_digest,
        config_count: event.configCount,
        signers: event
            .signers
            .iter()
            .map(|signer| signer.to_vec().into())
            .collect(),
        transmitters: event
            .transmitters
            .iter()
            .map(|transmitter| transmitter.to_string())
            .collect(),
        f: event.f,
        onchain_config: event.onchainConfig,
        offchain_config_version: event.offchainConfigVersion,
        offchain_config: event.offchainConfig,
    })
}

pub struct ConfigPoller {
    log_poller: Arc<dyn LogPoller>,
    address: Address,
    plugin_type: PluginType,
}

impl ConfigPoller {
    /// Registers the `ConfigSet` filter for `address`. A registration
    /// failure aborts construction.
    pub async fn new(
        log_poller: Arc<dyn LogPoller>,
        address: Address,
        plugin_type: PluginType,
    ) -> Result<Self> {
        let name = config_poller_filter_name(address);
        log_poller
            .register_filter(Filter {
                name: name.clone(),
                event_sigs: vec![ConfigSet::SIGNATURE_HASH],
                addresses: vec![address],
            })
            .await
            .map_err(|e| Error::filter_registration(&name, address, e))?;

        info!(contract = %address, plugin = %plugin_type, "Config poller watching contract");

        Ok(Self {
            log_poller,
            address,
            plugin_type,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Block and digest of the most recent config change, or `(0, zero)`
    /// when the contract has never been configured.
    pub async fn latest_config_details(&self) -> Result<(u64, B256)> {
        let latest = match self
            .log_poller
            .latest_log_by_event_sig_with_confs(
                ConfigSet::SIGNATURE_HASH,
                self.address,
                CONFIG_CONFIRMATIONS,
            )
            .await
        {
            Ok(log) => log,
            Err(LogPollerError::NotFound) => return Ok((0, B256::ZERO)),
            Err(e) => return Err(Error::log_poller("failed to fetch latest config log", e)),
        };

        let config = config_from_log(&latest, self.plugin_type)?;
        let block = u64::try_from(latest.block_number)
            .map_err(|_| Error::InvalidBlockHeight(latest.block_number))?;
        Ok((block, config.config_digest))
    }

    /// The config set at exactly `block`. When several configs landed in
    /// the same block, the last one wins.
    pub async fn latest_config(&self, block: u64) -> Result<ContractConfig> {
        let block = i64::try_from(block).map_err(|_| Error::BlockOutOfRange(block))?;
        let logs = self
            .log_poller
            .logs(block, block, ConfigSet::SIGNATURE_HASH, self.address)
            .await
            .map_err(|e| Error::log_poller(format!("failed to fetch config logs at block {block}"), e))?;

        let latest = logs.last().ok_or(Error::ConfigNotFound(block))?;
        let config = config_from_log(latest, self.plugin_type)?;
        debug!(
            block,
            digest = %config.config_digest,
            config_count = config.config_count,
            "Decoded latest config"
        );
        Ok(config)
    }

    pub async fn latest_block_height(&self) -> Result<u64> {
        match self.log_poller.latest_block().await {
            Ok(block) => u64::try_from(block).map_err(|_| Error::InvalidBlockHeight(block)),
            Err(LogPollerError::NotFound) => Ok(0),
            Err(e) => Err(Error::log_poller("failed to fetch latest block", e)),
        }
    }

    pub async fn replay(&self, from_block: i64) -> Result<()> {
        self.log_poller
            .replay(from_block)
            .await
            .map_err(|e| Error::log_poller(format!("failed to replay from block {from_block}"), e))
    }
}

impl Service for ConfigPoller {
    fn name(&self) -> String {
        "FunctionsConfigPoller".to_string()
    }
}
