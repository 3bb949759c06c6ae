//! Collaborator interfaces.
//!
//! The relay never talks to a chain, a database or a key store directly;
//! it goes through these traits. Production implementations live in the
//! node (or in [`crate::rpc`] for contract reads), tests use in-memory
//! fakes.

use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Log;

/// A read-only contract call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMsg {
    pub to: Address,
    pub data: Bytes,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Executes `call` against the state at `block`, or the latest block when `None`.
    async fn call_contract(&self, call: CallMsg, block: Option<u64>) -> anyhow::Result<Bytes>;
}

/// How the transaction manager should treat queued transactions from the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TxStrategy {
    /// Every transaction is broadcast.
    #[default]
    SendEvery,
    /// Keep at most `queue_size` unstarted transactions, dropping the oldest.
    DropOldest { queue_size: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmitCheckerType {
    #[default]
    None,
    /// Simulate the call before broadcasting and drop it if it reverts.
    Simulate,
}

/// Pre-broadcast checks the transaction manager runs on a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitCheckerSpec {
    pub checker_type: TransmitCheckerType,
}

/// A transaction handed to the transaction manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from_address: Address,
    pub to_address: Address,
    pub encoded_payload: Bytes,
    pub fee_limit: u64,
    /// Zero means "send directly from `from_address`".
    pub forwarder_address: Address,
    pub strategy: TxStrategy,
    pub checker: TransmitCheckerSpec,
    pub meta: Option<serde_json::Value>,
}

/// Handle returned by the transaction manager for a queued transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tx {
    pub id: i64,
}

#[async_trait]
pub trait TxManager: Send + Sync {
    /// Queues a transaction. Delivery, nonce assignment and retries belong to the manager.
    async fn create_transaction(&self, request: TxRequest) -> anyhow::Result<Tx>;
}

#[async_trait]
pub trait RoundRobinKeystore: Send + Sync {
    /// Picks the next sending address among `candidates` for `chain_id`.
    async fn get_round_robin_address(
        &self,
        chain_id: U256,
        candidates: &[Address],
    ) -> anyhow::Result<Address>;
}

/// A named log subscription registered with the log poller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub event_sigs: Vec<B256>,
    pub addresses: Vec<Address>,
}

/// Builds a filter name of the form `id - arg1:arg2`.
pub fn filter_name(id: &str, args: &[&dyn std::fmt::Display]) -> String {
    let Some((first, rest)) = args.split_first() else {
        return id.to_string();
    };
    let mut name = format!("{id} - {first}");
    for arg in rest {
        name.push(':');
        name.push_str(&arg.to_string());
    }
    name
}

#[derive(Debug, Error)]
pub enum LogPollerError {
    /// The query matched no rows.
    #[error("no rows in result set")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait LogPoller: Send + Sync {
    async fn register_filter(&self, filter: Filter) -> Result<(), LogPollerError>;

    /// Logs with `event_sig` from `address` in the inclusive block range.
    async fn logs(
        &self,
        start: i64,
        end: i64,
        event_sig: B256,
        address: Address,
    ) -> Result<Vec<Log>, LogPollerError>;

    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        confs: u64,
    ) -> Result<Log, LogPollerError>;

    async fn latest_block(&self) -> Result<i64, LogPollerError>;

    /// Re-scans the chain starting at `from_block`.
    async fn replay(&self, from_block: i64) -> Result<(), LogPollerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_name_formats() {
        assert_eq!(filter_name("Poller", &[]), "Poller");
        assert_eq!(filter_name("Poller", &[&"a"]), "Poller - a");
        assert_eq!(filter_name("Poller", &[&"a", &7]), "Poller - a:7");
    }

    #[test]
    fn strategy_deserializes_from_tagged_json() {
        let strategy: TxStrategy =
            serde_json::from_str(r#"{"kind":"drop_oldest","queue_size":3}"#).unwrap();
        assert_eq!(strategy, TxStrategy::DropOldest { queue_size: 3 });
    }
}

/// The node-side services a relay is built on.
#[derive(Clone)]
pub struct Collaborators {
    pub chain_reader: Arc<dyn ChainReader>,
    pub log_poller: Arc<dyn LogPoller>,
    pub keystore: Arc<dyn RoundRobinKeystore>,
    pub txm: Arc<dyn TxManager>,
}
