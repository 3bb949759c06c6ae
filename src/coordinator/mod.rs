//! Version-specific adapters over the Functions coordinator contracts.
//!
//! Each adapter turns raw `OracleRequest` / `OracleResponse` logs into the
//! canonical [`OracleRequest`] and [`OracleResponse`] types. The versions
//! differ only in the shape of the request commitment they re-encode.

mod v1;
mod v2;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, error};

use crate::client::{Filter, LogPoller};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::types::{Log, OracleRequest, OracleResponse};

pub use v1::CoordinatorV1;
pub use v2::CoordinatorV2;

#[async_trait]
pub trait Coordinator: Send + Sync {
    fn address(&self) -> Address;

    /// Registers the request and response filters. No-op for the zero
    /// address, which means the route is not configured yet.
    async fn register_filters(&self) -> Result<()>;

    fn oracle_request_log_topic(&self) -> B256;

    fn oracle_response_log_topic(&self) -> B256;

    /// Parses request logs. Unparseable logs are logged and skipped.
    fn logs_to_requests(&self, logs: &[Log]) -> Vec<OracleRequest>;

    /// Parses response logs. Unparseable logs are logged and skipped.
    fn logs_to_responses(&self, logs: &[Log]) -> Vec<OracleResponse>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CoordinatorVersion {
    #[default]
    V1,
    V2,
}

impl FromStr for CoordinatorVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            _ => Err(Error::UnknownCoordinatorVersion(s.to_string())),
        }
    }
}

impl fmt::Display for CoordinatorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

impl<'de> Deserialize<'de> for CoordinatorVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Builds the adapter for `version`. There is no fallback between versions.
pub fn new_coordinator(
    version: CoordinatorVersion,
    address: Address,
    log_poller: Arc<dyn LogPoller>,
    metrics: Arc<Metrics>,
) -> Arc<dyn Coordinator> {
    match version {
        CoordinatorVersion::V1 => Arc::new(CoordinatorV1::new(address, log_poller, metrics)),
        CoordinatorVersion::V2 => Arc::new(CoordinatorV2::new(address, log_poller, metrics)),
    }
}

pub fn coordinator_filter_name(address: Address, version: CoordinatorVersion) -> String {
    format!("FunctionsLogPollerWrapper:{address}-{version}")
}

/// Word offset of the commitment in `OracleRequest` log data. Every field
/// before it occupies exactly one head word.
const COMMITMENT_WORD_OFFSET: usize = 7;

/// Commitment words that cannot be forwarded as on-chain metadata.
#[derive(Debug, Error)]
pub enum CommitmentPackError {
    #[error("commitment field {field} exceeds uint{bits}")]
    FieldOverflow { field: &'static str, bits: usize },

    #[error("log data too short for a {words}-word commitment")]
    Truncated { words: usize },
}

/// Cuts the commitment out of raw request log data and checks every word
/// against the declared width in `layout`.
pub(crate) fn commitment_words(
    data: &[u8],
    layout: &[(&'static str, usize)],
) -> Result<Bytes, CommitmentPackError> {
    let start = COMMITMENT_WORD_OFFSET * 32;
    let words = data
        .get(start..start + layout.len() * 32)
        .ok_or(CommitmentPackError::Truncated { words: layout.len() })?;

    for (&(field, bits), word) in layout.iter().zip(words.chunks_exact(32)) {
        if U256::from_be_slice(word).bit_len() > bits {
            return Err(CommitmentPackError::FieldOverflow { field, bits });
        }
    }
    Ok(Bytes::copy_from_slice(words))
}

/// Decodes a request log without type checks. The topic is matched here,
/// the commitment widths by [`commitment_words`].
pub(crate) fn decode_request_log<E: SolEvent>(log: &Log) -> Result<E> {
    if log.event_sig() != Some(E::SIGNATURE_HASH) {
        return Err(Error::UnexpectedEvent { expected: E::SIGNATURE });
    }
    Ok(E::decode_raw_log(log.topics.iter().copied(), &log.data, false)?)
}

pub(crate) async fn register_coordinator_filters(
    log_poller: &dyn LogPoller,
    address: Address,
    version: CoordinatorVersion,
    request_topic: B256,
    response_topic: B256,
) -> Result<()> {
    if address == Address::ZERO {
        debug!(%version, "Coordinator address not set, skipping filter registration");
        return Ok(());
    }

    let name = coordinator_filter_name(address, version);
    log_poller
        .register_filter(Filter {
            name: name.clone(),
            event_sigs: vec![request_topic, response_topic],
            addresses: vec![address],
        })
        .await
        .map_err(|e| Error::filter_registration(&name, address, e))
}

/// Keeps the packed commitment, or logs the failure and drops it. The
/// request itself is still emitted.
pub(crate) fn onchain_metadata(
    request_id: B256,
    version: CoordinatorVersion,
    packed: Result<Bytes, CommitmentPackError>,
    metrics: &Metrics,
) -> Option<Bytes> {
    match packed {
        Ok(packed) => Some(packed),
        Err(e) => {
            error!(
                request_id = %request_id,
                %version,
                error = %e,
                "Failed to pack commitment, emitting request without metadata"
            );
            metrics.record_commitment_pack_failure();
            None
        }
    }
}

/// Parses each log with `parse`, skipping the ones that fail.
pub(crate) fn parse_logs<T>(
    logs: &[Log],
    kind: &'static str,
    parse: impl Fn(&Log) -> Result<T>,
    on_skip: impl Fn(),
) -> Vec<T> {
    logs.iter()
        .filter_map(|log| match parse(log) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                error!(
                    kind,
                    tx_hash = %log.tx_hash,
                    block = log.block_number,
                    error = %e,
                    "Failed to parse coordinator log, skipping"
                );
                on_skip();
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryLogPoller;

    #[test]
    fn parses_versions() {
        assert_eq!("v1".parse::<CoordinatorVersion>().unwrap(), CoordinatorVersion::V1);
        assert_eq!("V2".parse::<CoordinatorVersion>().unwrap(), CoordinatorVersion::V2);
        assert!("v3".parse::<CoordinatorVersion>().is_err());
    }

    const LAYOUT: [(&str, usize); 2] = [("fee", 72), ("gas", 40)];

    fn request_data(words: &[U256]) -> Vec<u8> {
        let mut data = vec![0u8; COMMITMENT_WORD_OFFSET * 32];
        for word in words {
            data.extend_from_slice(&word.to_be_bytes::<32>());
        }
        data
    }

    #[test]
    fn commitment_words_checks_declared_widths() {
        let fits = request_data(&[(U256::from(1u64) << 71), U256::from(7u64)]);
        let packed = commitment_words(&fits, &LAYOUT).unwrap();
        assert_eq!(&packed[..], &fits[COMMITMENT_WORD_OFFSET * 32..]);

        let wide = request_data(&[(U256::from(1u64) << 72), U256::from(7u64)]);
        assert!(matches!(
            commitment_words(&wide, &LAYOUT),
            Err(CommitmentPackError::FieldOverflow { field: "fee", bits: 72 })
        ));

        let short = request_data(&[U256::from(1u64)]);
        assert!(matches!(
            commitment_words(&short, &LAYOUT),
            Err(CommitmentPackError::Truncated { words: 2 })
        ));
    }

    #[test]
    fn pack_failure_drops_metadata_only() {
        let metrics = Metrics::new();
        let failed = Err(CommitmentPackError::FieldOverflow { field: "donFee", bits: 72 });

        assert!(onchain_metadata(B256::ZERO, CoordinatorVersion::V1, failed, &metrics).is_none());
        assert_eq!(
            metrics.commitment_pack_failures.load(std::sync::atomic::Ordering::Relaxed),
            1
        );

        let packed = Ok(Bytes::from_static(b"packed"));
        assert_eq!(
            onchain_metadata(B256::ZERO, CoordinatorVersion::V2, packed, &metrics),
            Some(Bytes::from_static(b"packed"))
        );
    }

    #[tokio::test]
    async fn factory_selects_version() {
        let lp = Arc::new(MemoryLogPoller::default());
        let metrics = Arc::new(Metrics::new());
        let address = Address::repeat_byte(0x10);

        let v1 = new_coordinator(CoordinatorVersion::V1, address, lp.clone(), metrics.clone());
        let v2 = new_coordinator(CoordinatorVersion::V2, address, lp.clone(), metrics);

        assert_eq!(v1.address(), address);
        assert_ne!(v1.oracle_request_log_topic(), v2.oracle_request_log_topic());
        assert_eq!(v1.oracle_response_log_topic(), v2.oracle_response_log_topic());

        v2.register_filters().await.unwrap();
        assert_eq!(lp.filters()[0].name, format!("FunctionsLogPollerWrapper:{address}-v2"));
    }
}
