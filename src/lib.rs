//! On-chain transmission and log polling for the OCR2 Functions plugin.
//!
//! - [`encoding`]: report codec for batches of processed requests.
//! - [`digester`] / [`config_poller`]: config digests and the latest on-chain config.
//! - [`coordinator`]: V1/V2 adapters turning coordinator logs into requests and responses.
//! - [`transmitter`]: picks the destination coordinator and queues `transmit` calls.
//! - [`provider`]: builds all of the above from a [`config::RelayConfig`].
//!
//! Chain access, transaction sending and log indexing go through the
//! collaborator traits in [`client`].

pub mod bindings;
pub mod client;
pub mod config;
pub mod config_poller;
pub mod coordinator;
pub mod digester;
pub mod encoding;
pub mod error;
pub mod logpoller_wrapper;
pub mod metrics;
pub mod provider;
pub mod reader;
pub mod rpc;
pub mod service;
pub mod transmitter;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use config_poller::ConfigPoller;
pub use coordinator::{Coordinator, CoordinatorVersion, new_coordinator};
pub use digester::{OffchainConfigDigester, PluginType};
pub use encoding::ReportCodec;
pub use error::{Error, Result};
pub use logpoller_wrapper::LogPollerWrapper;
pub use metrics::Metrics;
pub use provider::FunctionsProvider;
pub use service::Service;
pub use transmitter::{ContractTransmitter, TransmitterOpts};
pub use types::*;
