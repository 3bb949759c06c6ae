use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;

use super::{
    CommitmentPackError, Coordinator, CoordinatorVersion, commitment_words, decode_request_log,
    onchain_metadata, parse_logs, register_coordinator_filters,
};
use crate::bindings::FunctionsCoordinatorV2::{
    OracleRequest as OracleRequestEvent, OracleResponse as OracleResponseEvent,
};
use crate::client::LogPoller;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::types::{Log, OracleRequest, OracleResponse};

/// V1 layout followed by the operation fee.
const COMMITMENT_LAYOUT: [(&str, usize); 12] = [
    ("requestId", 256),
    ("coordinator", 160),
    ("estimatedTotalCostJuels", 96),
    ("client", 160),
    ("subscriptionId", 64),
    ("callbackGasLimit", 32),
    ("adminFee", 72),
    ("donFee", 72),
    ("gasOverheadBeforeCallback", 40),
    ("gasOverheadAfterCallback", 40),
    ("timeoutTimestamp", 32),
    ("operationFee", 72),
];

pub(super) fn pack_commitment(data: &[u8]) -> Result<Bytes, CommitmentPackError> {
    commitment_words(data, &COMMITMENT_LAYOUT)
}

/// Adapter for coordinators whose commitment carries an operation fee.
pub struct CoordinatorV2 {
    address: Address,
    log_poller: Arc<dyn LogPoller>,
    metrics: Arc<Metrics>,
}

impl CoordinatorV2 {
    pub fn new(address: Address, log_poller: Arc<dyn LogPoller>, metrics: Arc<Metrics>) -> Self {
        Self {
            address,
            log_poller,
            metrics,
        }
    }

    fn to_request(&self, log: &Log, event: OracleRequestEvent) -> OracleRequest {
        let onchain_metadata = onchain_metadata(
            event.requestId,
            CoordinatorVersion::V2,
            pack_commitment(&log.data),
            &self.metrics,
        );

        OracleRequest {
            request_id: event.requestId,
            requesting_contract: event.requestingContract,
            request_initiator: event.requestInitiator,
            subscription_id: event.subscriptionId,
            subscription_owner: event.subscriptionOwner,
            data: event.data,
            data_version: event.dataVersion,
            flags: event.flags,
            callback_gas_limit: event.callbackGasLimit,
            tx_hash: log.tx_hash,
            onchain_metadata,
            coordinator_contract: self.address,
        }
    }
}

#[async_trait]
impl Coordinator for CoordinatorV2 {
    fn address(&self) -> Address {
        self.address
    }

    async fn register_filters(&self) -> Result<()> {
        register_coordinator_filters(
            self.log_poller.as_ref(),
            self.address,
            CoordinatorVersion::V2,
            self.oracle_request_log_topic(),
            self.oracle_response_log_topic(),
        )
        .await
    }

    fn oracle_request_log_topic(&self) -> B256 {
        OracleRequestEvent::SIGNATURE_HASH
    }

    fn oracle_response_log_topic(&self) -> B256 {
        OracleResponseEvent::SIGNATURE_HASH
    }

    fn logs_to_requests(&self, logs: &[Log]) -> Vec<OracleRequest> {
        parse_logs(
            logs,
            "OracleRequest",
            |log| {
                let event = decode_request_log::<OracleRequestEvent>(log)?;
                Ok(self.to_request(log, event))
            },
            || self.metrics.record_skipped_request_log(),
        )
    }

    fn logs_to_responses(&self, logs: &[Log]) -> Vec<OracleResponse> {
        parse_logs(
            logs,
            "OracleResponse",
            |log| {
                let event =
                    OracleResponseEvent::decode_raw_log(log.topics.iter().copied(), &log.data, true)?;
                Ok(OracleResponse {
                    request_id: event.requestId,
                })
            },
            || self.metrics.record_skipped_response_log(),
        )
    }
}
