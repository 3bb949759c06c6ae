//! Typed reads of the coordinator's OCR2 view functions.

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolCall;

use crate::bindings::OCR2Base::{latestConfigDetailsCall, latestConfigDigestAndEpochCall};
use crate::client::{CallMsg, ChainReader};
use crate::error::{Error, Result};

/// Return values of `latestConfigDigestAndEpoch()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestAndEpoch {
    /// Set when the contract does not track the epoch itself and the
    /// caller must find it in the `Transmitted` logs.
    pub scan_logs: bool,
    pub config_digest: B256,
    pub epoch: u32,
}

/// Return values of `latestConfigDetails()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDetails {
    pub config_count: u32,
    pub block_number: u32,
    pub config_digest: B256,
}

async fn call<C: SolCall>(reader: &dyn ChainReader, address: Address, call: C) -> Result<C::Return> {
    let raw = reader
        .call_contract(
            CallMsg {
                to: address,
                data: call.abi_encode().into(),
            },
            None,
        )
        .await
        .map_err(|e| Error::downstream(format!("{} call to {address}", C::SIGNATURE), e))?;
    Ok(C::abi_decode_returns(&raw, true)?)
}

pub async fn latest_config_digest_and_epoch(
    reader: &dyn ChainReader,
    address: Address,
) -> Result<DigestAndEpoch> {
    let ret = call(reader, address, latestConfigDigestAndEpochCall {}).await?;
    Ok(DigestAndEpoch {
        scan_logs: ret.scanLogs,
        config_digest: ret.configDigest,
        epoch: ret.epoch,
    })
}

pub async fn latest_config_details(reader: &dyn ChainReader, address: Address) -> Result<ConfigDetails> {
    let ret = call(reader, address, latestConfigDetailsCall {}).await?;
    Ok(ConfigDetails {
        config_count: ret.configCount,
        block_number: ret.blockNumber,
        config_digest: ret.configDigest,
    })
}
