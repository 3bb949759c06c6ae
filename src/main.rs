//! Functions relay inspector
//!
//! Reads the OCR2 state of a Functions coordinator over JSON-RPC and checks
//! it against the local relay configuration:
//!
//! - **Chain**: the node's chain id against `CHAIN_ID`.
//! - **Config**: `latestConfigDetails()` and the digest as the configured plugin sees it.
//! - **Epoch**: `latestConfigDigestAndEpoch()`, and whether transmitters must scan logs for it.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use functions_relay::config::RelayConfig;
use functions_relay::digester::{OffchainConfigDigester, apply_digest_prefix};
use functions_relay::reader;
use functions_relay::rpc::RpcClient;

#[tokio::main]
async fn main() -> Result<()> {
    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = RelayConfig::load().context("invalid configuration")?;

    info!(
        coordinator = %config.coordinator_address,
        coordinator_version = %config.coordinator_version,
        plugin = %config.plugin_type,
        transmitter = %config.effective_transmitter(),
        "Inspecting Functions coordinator"
    );
    info!(rpc = %config.rpc_url, chain_id = config.chain_id, "Endpoint configured");

    let rpc = RpcClient::new(&config.rpc_url)?;

    let chain_id = rpc.chain_id().await.context("failed to read chain id")?;
    if chain_id != config.chain_id() {
        warn!(node = %chain_id, configured = config.chain_id, "Chain id mismatch");
    }

    let details = reader::latest_config_details(&rpc, config.coordinator_address)
        .await
        .context("failed to read latest config details")?;
    if details.config_count == 0 {
        warn!("Coordinator has not been configured yet");
        return Ok(());
    }

    let digester =
        OffchainConfigDigester::new(config.plugin_type, config.chain_id(), config.coordinator_address);
    let expected_prefix = digester.config_digest_prefix();
    let onchain_prefix = u16::from_be_bytes([details.config_digest[0], details.config_digest[1]]);
    let mut plugin_digest = details.config_digest;
    apply_digest_prefix(&mut plugin_digest, expected_prefix);

    info!(
        config_count = details.config_count,
        block_number = details.block_number,
        onchain_digest = %details.config_digest,
        plugin_digest = %plugin_digest,
        "Latest config"
    );
    if onchain_prefix != expected_prefix {
        info!(
            onchain_prefix = format_args!("{onchain_prefix:#06x}"),
            expected_prefix = format_args!("{expected_prefix:#06x}"),
            "On-chain digest carries another plugin's prefix, the config poller rewrites it"
        );
    }

    let latest = reader::latest_config_digest_and_epoch(&rpc, config.coordinator_address)
        .await
        .context("failed to read latest digest and epoch")?;
    info!(
        digest = %latest.config_digest,
        epoch = latest.epoch,
        scan_logs = latest.scan_logs,
        "Latest transmission"
    );
    if latest.scan_logs {
        info!("Contract does not track the epoch, transmitters read it from Transmitted logs");
    }

    Ok(())
}
