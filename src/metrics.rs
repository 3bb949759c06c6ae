//! Counters for the relay.
//!
//! All counters are backed by atomics for lock-free concurrent access.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated relay metrics.
///
/// Thread-safe via atomics; share via `Arc<Metrics>`.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Reports handed to the transaction manager.
    pub reports_transmitted: AtomicU64,
    /// Transmissions that failed validation, packing or submission.
    pub transmit_failures: AtomicU64,
    /// Reports whose requests named more than one coordinator.
    pub coordinator_mismatches: AtomicU64,
    /// `OracleRequest` logs that could not be parsed.
    pub request_logs_skipped: AtomicU64,
    /// `OracleResponse` logs that could not be parsed.
    pub response_logs_skipped: AtomicU64,
    /// Requests emitted without on-chain metadata because packing failed.
    pub commitment_pack_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transmission(&self) {
        self.reports_transmitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transmit_failure(&self) {
        self.transmit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coordinator_mismatch(&self) {
        self.coordinator_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_request_log(&self) {
        self.request_logs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_response_log(&self) {
        self.response_logs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commitment_pack_failure(&self) {
        self.commitment_pack_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Serialize metrics as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "reports_transmitted": self.reports_transmitted.load(Ordering::Relaxed),
            "transmit_failures": self.transmit_failures.load(Ordering::Relaxed),
            "coordinator_mismatches": self.coordinator_mismatches.load(Ordering::Relaxed),
            "request_logs_skipped": self.request_logs_skipped.load(Ordering::Relaxed),
            "response_logs_skipped": self.response_logs_skipped.load(Ordering::Relaxed),
            "commitment_pack_failures": self.commitment_pack_failures.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.record_transmission();
        metrics.record_transmission();
        metrics.record_skipped_request_log();

        let json = metrics.to_json();
        assert_eq!(json["reports_transmitted"], 2);
        assert_eq!(json["request_logs_skipped"], 1);
        assert_eq!(json["transmit_failures"], 0);
    }
}
