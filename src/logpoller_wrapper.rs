//! Routing information for the Functions transmitter.

use alloy_primitives::Address;

use crate::error::Result;
use crate::service::Service;

/// Reports which coordinator is active and which one is proposed.
#[derive(Debug, Default)]
pub struct LogPollerWrapper;

impl LogPollerWrapper {
    pub fn new() -> Self {
        Self
    }

    /// `(active, proposed)` coordinator addresses. Both are zero until routes
    /// are derived from the router's contract-update logs.
    // TODO: derive routes from the router's ContractUpdated logs once the log
    // poller exposes a multi-consumer query.
    pub async fn latest_routes(&self) -> Result<(Address, Address)> {
        Ok((Address::ZERO, Address::ZERO))
    }
}

impl Service for LogPollerWrapper {
    fn name(&self) -> String {
        "FunctionsLogPollerWrapper".to_string()
    }
}
