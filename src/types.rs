//! Canonical data types shared by the relay components.

use alloy_primitives::{Address, B256, Bytes};

/// One oracle-processed response, as carried inside a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedRequest {
    /// Must be exactly 32 bytes once serialized into a report.
    pub request_id: Bytes,
    pub result: Bytes,
    pub error: Bytes,
    /// Opaque commitment bytes produced by a coordinator adapter.
    pub onchain_metadata: Bytes,
    /// Destination coordinator address (20 bytes on EVM chains).
    pub coordinator_contract: Bytes,
    /// Never serialized into a report; always zero after decoding.
    pub callback_gas_limit: u32,
}

/// A request emitted by a coordinator's `OracleRequest` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleRequest {
    pub request_id: B256,
    pub requesting_contract: Address,
    pub request_initiator: Address,
    pub subscription_id: u64,
    pub subscription_owner: Address,
    pub data: Bytes,
    pub data_version: u16,
    pub flags: B256,
    pub callback_gas_limit: u64,
    pub tx_hash: B256,
    /// Flat ABI encoding of the request commitment, `None` when packing failed.
    pub onchain_metadata: Option<Bytes>,
    pub coordinator_contract: Address,
}

/// A response observed through a coordinator's `OracleResponse` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleResponse {
    pub request_id: B256,
}

/// Mirror of the on-chain OCR2 `ConfigSet` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractConfig {
    pub config_digest: B256,
    pub config_count: u64,
    pub signers: Vec<Bytes>,
    /// 0x-prefixed hex account strings, parallel to `signers`.
    pub transmitters: Vec<String>,
    pub f: u8,
    pub onchain_config: Bytes,
    pub offchain_config_version: u64,
    pub offchain_config: Bytes,
}

/// A row from the log poller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: i64,
    pub block_hash: B256,
    pub tx_hash: B256,
    pub log_index: i64,
}

impl Log {
    /// The event signature, if the log has any topics.
    pub fn event_sig(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

/// Timestamp of an OCR report: which config, epoch and round produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTimestamp {
    pub config_digest: B256,
    pub epoch: u32,
    pub round: u8,
}

/// Full OCR report context handed to `transmit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportContext {
    pub timestamp: ReportTimestamp,
    pub extra_hash: B256,
}

impl ReportContext {
    /// Packs the context into the three words the aggregator expects.
    ///
    /// Word 1 ends with the epoch (4 bytes, big endian) and then the round.
    pub fn raw(&self) -> [B256; 3] {
        let mut epoch_and_round = [0u8; 32];
        epoch_and_round[27..31].copy_from_slice(&self.timestamp.epoch.to_be_bytes());
        epoch_and_round[31] = self.timestamp.round;
        [
            self.timestamp.config_digest,
            B256::from(epoch_and_round),
            self.extra_hash,
        ]
    }
}

/// A signature produced by one oracle over a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributedOnchainSignature {
    /// `r || s || v`, 65 bytes.
    pub signature: Bytes,
    pub signer: u8,
}
