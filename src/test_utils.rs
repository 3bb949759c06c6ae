//! In-memory collaborator fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolEvent;
use anyhow::anyhow;
use async_trait::async_trait;

use crate::client::{
    CallMsg, ChainReader, Filter, LogPoller, LogPollerError, RoundRobinKeystore, Tx, TxManager,
    TxRequest,
};
use crate::types::Log;

static NEXT_TX: AtomicU64 = AtomicU64::new(1);

/// Builds the log `event` would emit from `address`, with a fresh tx hash.
pub fn log_at<E: SolEvent>(address: Address, block: i64, event: &E) -> Log {
    let encoded = event.encode_log_data();
    let n = NEXT_TX.fetch_add(1, Ordering::Relaxed);
    Log {
        address,
        topics: encoded.topics().to_vec(),
        data: encoded.data.clone(),
        block_number: block,
        block_hash: B256::left_padding_from(&block.to_be_bytes()),
        tx_hash: B256::left_padding_from(&n.to_be_bytes()),
        log_index: 0,
    }
}

#[derive(Default)]
struct LogStore {
    logs: Vec<Log>,
    filters: Vec<Filter>,
    latest_block: Option<i64>,
    replays: Vec<i64>,
    fail_register: bool,
    fail_queries: bool,
}

/// Log poller over a vector. Filter names must be unique.
#[derive(Default)]
pub struct MemoryLogPoller {
    store: Mutex<LogStore>,
}

impl MemoryLogPoller {
    pub fn push(&self, log: Log) {
        self.store.lock().unwrap().logs.push(log);
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.store.lock().unwrap().filters.clone()
    }

    pub fn replays(&self) -> Vec<i64> {
        self.store.lock().unwrap().replays.clone()
    }

    pub fn set_latest_block(&self, block: i64) {
        self.store.lock().unwrap().latest_block = Some(block);
    }

    pub fn fail_register_filter(&self) {
        self.store.lock().unwrap().fail_register = true;
    }

    pub fn fail_queries(&self) {
        self.store.lock().unwrap().fail_queries = true;
    }

    fn check_queries(store: &LogStore) -> Result<(), LogPollerError> {
        if store.fail_queries {
            return Err(anyhow!("log store unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl LogPoller for MemoryLogPoller {
    async fn register_filter(&self, filter: Filter) -> Result<(), LogPollerError> {
        let mut store = self.store.lock().unwrap();
        if store.fail_register {
            return Err(anyhow!("filter table is read-only").into());
        }
        if store.filters.iter().any(|f| f.name == filter.name) {
            return Err(anyhow!("duplicate filter {}", filter.name).into());
        }
        store.filters.push(filter);
        Ok(())
    }

    async fn logs(
        &self,
        start: i64,
        end: i64,
        event_sig: B256,
        address: Address,
    ) -> Result<Vec<Log>, LogPollerError> {
        let store = self.store.lock().unwrap();
        Self::check_queries(&store)?;
        Ok(store
            .logs
            .iter()
            .filter(|log| {
                (start..=end).contains(&log.block_number)
                    && log.event_sig() == Some(event_sig)
                    && log.address == address
            })
            .cloned()
            .collect())
    }

    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        confs: u64,
    ) -> Result<Log, LogPollerError> {
        let store = self.store.lock().unwrap();
        Self::check_queries(&store)?;
        // Without a head every stored log counts as confirmed.
        let max_block = match store.latest_block {
            Some(head) => head - confs as i64 + 1,
            None => i64::MAX,
        };
        store
            .logs
            .iter()
            .filter(|log| {
                log.event_sig() == Some(event_sig)
                    && log.address == address
                    && log.block_number <= max_block
            })
            .max_by_key(|log| (log.block_number, log.log_index))
            .cloned()
            .ok_or(LogPollerError::NotFound)
    }

    async fn latest_block(&self) -> Result<i64, LogPollerError> {
        let store = self.store.lock().unwrap();
        Self::check_queries(&store)?;
        store.latest_block.ok_or(LogPollerError::NotFound)
    }

    async fn replay(&self, from_block: i64) -> Result<(), LogPollerError> {
        self.store.lock().unwrap().replays.push(from_block);
        Ok(())
    }
}

/// Answers contract calls from a queue of canned responses.
#[derive(Default)]
pub struct ScriptedChainReader {
    responses: Mutex<VecDeque<anyhow::Result<Bytes>>>,
    calls: Mutex<Vec<(CallMsg, Option<u64>)>>,
}

impl ScriptedChainReader {
    pub fn respond(&self, data: impl Into<Bytes>) {
        self.responses.lock().unwrap().push_back(Ok(data.into()));
    }

    pub fn fail(&self, msg: &'static str) {
        self.responses.lock().unwrap().push_back(Err(anyhow!(msg)));
    }

    pub fn calls(&self) -> Vec<(CallMsg, Option<u64>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainReader for ScriptedChainReader {
    async fn call_contract(&self, call: CallMsg, block: Option<u64>) -> anyhow::Result<Bytes> {
        self.calls.lock().unwrap().push((call, block));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response")))
    }
}

/// Records every transaction it is handed.
#[derive(Default)]
pub struct RecordingTxManager {
    requests: Mutex<Vec<TxRequest>>,
    fail: Mutex<bool>,
}

impl RecordingTxManager {
    pub fn requests(&self) -> Vec<TxRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl TxManager for RecordingTxManager {
    async fn create_transaction(&self, request: TxRequest) -> anyhow::Result<Tx> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("nonce too low"));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        Ok(Tx {
            id: requests.len() as i64,
        })
    }
}

/// Always hands out the same address, or always fails when `None`.
pub struct FixedKeystore(pub Option<Address>);

#[async_trait]
impl RoundRobinKeystore for FixedKeystore {
    async fn get_round_robin_address(
        &self,
        _chain_id: U256,
        candidates: &[Address],
    ) -> anyhow::Result<Address> {
        let address = self.0.ok_or_else(|| anyhow!("no sending keys"))?;
        if !candidates.is_empty() && !candidates.contains(&address) {
            return Err(anyhow!("{address} is not among the candidates"));
        }
        Ok(address)
    }
}
