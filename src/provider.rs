//! Wires the relay components for one Functions coordinator from a
//! [`RelayConfig`] and the node's collaborators.

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::info;

use crate::client::Collaborators;
use crate::config::RelayConfig;
use crate::config_poller::ConfigPoller;
use crate::coordinator::{Coordinator, new_coordinator};
use crate::digester::OffchainConfigDigester;
use crate::encoding::ReportCodec;
use crate::error::Result;
use crate::logpoller_wrapper::LogPollerWrapper;
use crate::metrics::Metrics;
use crate::service::{HealthReport, Service};
use crate::transmitter::{ContractTransmitter, TransmitterOpts};

pub struct FunctionsProvider {
    config_poller: Arc<ConfigPoller>,
    digester: OffchainConfigDigester,
    codec: ReportCodec,
    coordinator: Arc<dyn Coordinator>,
    log_poller_wrapper: Arc<LogPollerWrapper>,
    transmitter: Arc<ContractTransmitter>,
    metrics: Arc<Metrics>,
}

impl FunctionsProvider {
    /// Builds every component and registers its log filters. The
    /// transmitter starts out routed to the configured coordinator.
    pub async fn new(config: &RelayConfig, deps: Collaborators) -> Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let address = config.coordinator_address;

        let config_poller = ConfigPoller::new(deps.log_poller.clone(), address, config.plugin_type).await?;
        let digester = OffchainConfigDigester::new(config.plugin_type, config.chain_id(), address);
        let codec = ReportCodec::new(config.contract_version)?;

        let coordinator = new_coordinator(
            config.coordinator_version,
            address,
            deps.log_poller.clone(),
            metrics.clone(),
        );
        coordinator.register_filters().await?;

        let transmitter = ContractTransmitter::new(TransmitterOpts::from_config(
            config,
            &deps,
            metrics.clone(),
        ))?;
        transmitter.update_routes(address, Address::ZERO).await?;

        info!(
            coordinator = %address,
            coordinator_version = %config.coordinator_version,
            plugin = %config.plugin_type,
            from = %transmitter.from_account(),
            "Functions provider ready"
        );

        Ok(Self {
            config_poller: Arc::new(config_poller),
            digester,
            codec,
            coordinator,
            log_poller_wrapper: Arc::new(LogPollerWrapper::new()),
            transmitter: Arc::new(transmitter),
            metrics,
        })
    }

    pub fn config_poller(&self) -> &Arc<ConfigPoller> {
        &self.config_poller
    }

    pub fn digester(&self) -> &OffchainConfigDigester {
        &self.digester
    }

    pub fn codec(&self) -> &ReportCodec {
        &self.codec
    }

    pub fn coordinator(&self) -> &Arc<dyn Coordinator> {
        &self.coordinator
    }

    pub fn log_poller_wrapper(&self) -> &Arc<LogPollerWrapper> {
        &self.log_poller_wrapper
    }

    pub fn transmitter(&self) -> &Arc<ContractTransmitter> {
        &self.transmitter
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    fn services(&self) -> [&dyn Service; 3] {
        [
            self.config_poller.as_ref(),
            self.log_poller_wrapper.as_ref(),
            self.transmitter.as_ref(),
        ]
    }
}

#[async_trait]
impl Service for FunctionsProvider {
    fn name(&self) -> String {
        "FunctionsProvider".to_string()
    }

    async fn start(&self) -> Result<()> {
        for service in self.services() {
            service.start().await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for service in self.services().into_iter().rev() {
            service.close().await?;
        }
        Ok(())
    }

    fn ready(&self) -> Result<()> {
        self.services().iter().try_for_each(|service| service.ready())
    }

    fn health_report(&self) -> HealthReport {
        let mut report = HealthReport::from([(self.name(), self.ready())]);
        for service in self.services() {
            report.extend(service.health_report());
        }
        report
    }
}
