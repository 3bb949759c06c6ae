//! Transmission of signed Functions reports to the active coordinator.
//!
//! Each transmission:
//! 1. Splits the oracle signatures into the `rs`, `ss` and `rawVs` arguments.
//! 2. Decodes the report to find the destination coordinator (the first
//!    request's coordinator; later requests are only checked).
//! 3. Packs `transmit(reportContext, report, rs, ss, rawVs)` and queues it
//!    with the transaction manager from a round-robin sending key.
//!
//! Delivery and retries belong to the transaction manager.

use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolEvent};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::bindings::OCR2Base::{Transmitted, transmitCall};
use crate::client::{
    ChainReader, Collaborators, Filter, LogPoller, LogPollerError, RoundRobinKeystore,
    TransmitCheckerSpec, TxManager, TxRequest, TxStrategy, filter_name,
};
use crate::config::RelayConfig;
use crate::encoding::ReportCodec;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::reader;
use crate::service::Service;
use crate::types::{AttributedOnchainSignature, ReportContext};

/// `rawVs` is a single word, one `v` byte per signer.
pub const MAX_SIGNATURES: usize = 32;

const SIGNATURE_LENGTH: usize = 65;
const ADDRESS_LENGTH: usize = 20;
const TRANSMITTED_CONFIRMATIONS: u64 = 1;

pub fn transmitter_filter_name(address: Address) -> String {
    filter_name("FunctionsOCR2ContractTransmitter", &[&address])
}

/// Splits `r || s || v`.
fn split_signature(signature: &[u8]) -> Result<(B256, B256, u8)> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(Error::InvalidSignature(signature.len()));
    }
    Ok((
        B256::from_slice(&signature[..32]),
        B256::from_slice(&signature[32..64]),
        signature[64],
    ))
}

fn coordinator_address(raw: &[u8]) -> Result<Address> {
    if raw.len() != ADDRESS_LENGTH {
        return Err(Error::InvalidCoordinatorContract(raw.len()));
    }
    let address = Address::from_slice(raw);
    if address == Address::ZERO {
        return Err(Error::ZeroCoordinatorContract);
    }
    Ok(address)
}

/// Everything a [`ContractTransmitter`] is built from.
pub struct TransmitterOpts {
    pub chain_reader: Arc<dyn ChainReader>,
    pub log_poller: Arc<dyn LogPoller>,
    pub keystore: Option<Arc<dyn RoundRobinKeystore>>,
    pub txm: Arc<dyn TxManager>,
    pub from_addresses: Vec<Address>,
    pub gas_limit: u64,
    /// Identity the node transmits under. When it is not one of the
    /// sending keys it is a forwarder contract.
    pub effective_transmitter_address: Address,
    pub strategy: TxStrategy,
    pub checker: TransmitCheckerSpec,
    pub chain_id: U256,
    pub contract_version: u32,
    pub metrics: Arc<Metrics>,
}

impl TransmitterOpts {
    pub fn from_config(config: &RelayConfig, deps: &Collaborators, metrics: Arc<Metrics>) -> Self {
        Self {
            chain_reader: deps.chain_reader.clone(),
            log_poller: deps.log_poller.clone(),
            keystore: Some(deps.keystore.clone()),
            txm: deps.txm.clone(),
            from_addresses: config.from_addresses.clone(),
            gas_limit: config.gas_limit,
            effective_transmitter_address: config.effective_transmitter(),
            strategy: config.strategy,
            checker: config.checker,
            chain_id: config.chain_id(),
            contract_version: config.contract_version,
            metrics,
        }
    }
}

pub struct ContractTransmitter {
    contract_address: RwLock<Option<Address>>,
    codec: ReportCodec,
    chain_reader: Arc<dyn ChainReader>,
    log_poller: Arc<dyn LogPoller>,
    keystore: Arc<dyn RoundRobinKeystore>,
    txm: Arc<dyn TxManager>,
    from_addresses: Vec<Address>,
    gas_limit: u64,
    effective_transmitter_address: Address,
    strategy: TxStrategy,
    checker: TransmitCheckerSpec,
    chain_id: U256,
    metrics: Arc<Metrics>,
}

impl ContractTransmitter {
    pub fn new(opts: TransmitterOpts) -> Result<Self> {
        let keystore = opts.keystore.ok_or(Error::MissingKeystore)?;
        let codec = ReportCodec::new(opts.contract_version)?;

        Ok(Self {
            contract_address: RwLock::new(None),
            codec,
            chain_reader: opts.chain_reader,
            log_poller: opts.log_poller,
            keystore,
            txm: opts.txm,
            from_addresses: opts.from_addresses,
            gas_limit: opts.gas_limit,
            effective_transmitter_address: opts.effective_transmitter_address,
            strategy: opts.strategy,
            checker: opts.checker,
            chain_id: opts.chain_id,
            metrics: opts.metrics,
        })
    }

    /// The coordinator currently receiving transmissions, if routed.
    pub async fn contract_address(&self) -> Option<Address> {
        *self.contract_address.read().await
    }

    /// Points transmissions at `active`. The proposed coordinator is not
    /// tracked. Filters for earlier coordinators stay registered.
    ///
    /// The route is switched before the `Transmitted` filter is registered.
    /// After a failed registration, repeating the call with the same address
    /// returns `Ok` without registering; route to another address first to
    /// retry.
    pub async fn update_routes(&self, active: Address, proposed: Address) -> Result<()> {
        let previous = self.contract_address.write().await.replace(active);
        if previous == Some(active) {
            return Ok(());
        }

        info!(
            active = %active,
            proposed = %proposed,
            previous = ?previous,
            "Updating transmitter route"
        );

        let name = transmitter_filter_name(active);
        self.log_poller
            .register_filter(Filter {
                name: name.clone(),
                event_sigs: vec![Transmitted::SIGNATURE_HASH],
                addresses: vec![active],
            })
            .await
            .map_err(|e| Error::filter_registration(&name, active, e))
    }

    /// Queues a `transmit` call for `report` with the transaction manager.
    #[instrument(skip_all, fields(epoch = report_context.timestamp.epoch, round = report_context.timestamp.round))]
    pub async fn transmit(
        &self,
        report_context: &ReportContext,
        report: &[u8],
        signatures: &[AttributedOnchainSignature],
    ) -> Result<()> {
        match self.try_transmit(report_context, report, signatures).await {
            Ok(()) => {
                self.metrics.record_transmission();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_transmit_failure();
                Err(e)
            }
        }
    }

    async fn try_transmit(
        &self,
        report_context: &ReportContext,
        report: &[u8],
        signatures: &[AttributedOnchainSignature],
    ) -> Result<()> {
        if signatures.len() > MAX_SIGNATURES {
            return Err(Error::TooManySignatures {
                max: MAX_SIGNATURES,
                actual: signatures.len(),
            });
        }

        let mut rs = Vec::with_capacity(signatures.len());
        let mut ss = Vec::with_capacity(signatures.len());
        let mut vs = [0u8; 32];
        for (i, attributed) in signatures.iter().enumerate() {
            let (r, s, v) = split_signature(&attributed.signature)?;
            rs.push(r);
            ss.push(s);
            vs[i] = v;
        }

        let requests = self.codec.decode_report(report)?;
        let first = requests.first().ok_or(Error::EmptyReport)?;
        let destination = coordinator_address(&first.coordinator_contract)?;

        let mut mismatched = false;
        for request in &requests[1..] {
            if request.coordinator_contract[..] != destination[..] {
                warn!(
                    request_id = %request.request_id,
                    coordinator = %request.coordinator_contract,
                    destination = %destination,
                    "Report mixes coordinators, sending every request to the first one"
                );
                mismatched = true;
            }
        }
        if mismatched {
            self.metrics.record_coordinator_mismatch();
        }

        let payload = transmitCall {
            reportContext: report_context.raw(),
            report: Bytes::copy_from_slice(report),
            rs,
            ss,
            rawVs: B256::from(vs),
        }
        .abi_encode();

        let from_address = self
            .keystore
            .get_round_robin_address(self.chain_id, &self.from_addresses)
            .await
            .map_err(|e| {
                Error::downstream("skipped OCR transmission, error getting round-robin address", e)
            })?;

        let forwarder_address = if self.from_addresses.contains(&self.effective_transmitter_address) {
            Address::ZERO
        } else {
            self.effective_transmitter_address
        };

        debug!(
            destination = %destination,
            from = %from_address,
            forwarder = %forwarder_address,
            requests = requests.len(),
            signatures = signatures.len(),
            "Submitting transmission"
        );

        let tx = self
            .txm
            .create_transaction(TxRequest {
                from_address,
                to_address: destination,
                encoded_payload: payload.into(),
                fee_limit: self.gas_limit,
                forwarder_address,
                strategy: self.strategy,
                checker: self.checker,
                meta: None,
            })
            .await
            .map_err(|e| Error::downstream(format!("failed to send transaction to {destination}"), e))?;

        debug!(tx_id = tx.id, destination = %destination, "Transmission queued");
        Ok(())
    }

    /// Digest and epoch of the last transmission accepted by the active
    /// coordinator. Falls back to the latest `Transmitted` log when the
    /// contract asks for a log scan; no such log means epoch 0.
    pub async fn latest_config_digest_and_epoch(&self) -> Result<(B256, u32)> {
        let address = self
            .contract_address()
            .await
            .ok_or(Error::ContractAddressNotSet)?;

        let latest = reader::latest_config_digest_and_epoch(self.chain_reader.as_ref(), address).await?;
        if !latest.scan_logs {
            return Ok((latest.config_digest, latest.epoch));
        }

        match self
            .log_poller
            .latest_log_by_event_sig_with_confs(
                Transmitted::SIGNATURE_HASH,
                address,
                TRANSMITTED_CONFIRMATIONS,
            )
            .await
        {
            Ok(log) => {
                let event = Transmitted::decode_raw_log(log.topics.iter().copied(), &log.data, true)?;
                Ok((event.configDigest, event.epoch))
            }
            Err(LogPollerError::NotFound) => Ok((latest.config_digest, 0)),
            Err(e) => Err(Error::log_poller(
                format!("failed to fetch latest Transmitted log for {address}"),
                e,
            )),
        }
    }

    pub fn from_account(&self) -> Address {
        self.effective_transmitter_address
    }
}

impl Service for ContractTransmitter {
    fn name(&self) -> String {
        "FunctionsOCR2ContractTransmitter".to_string()
    }
}
