use alloy_primitives::Address;
use thiserror::Error;

use crate::client::LogPollerError;

/// Convenience alias used throughout the relay.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the relay components.
///
/// Variants fall into three groups: configuration errors raised at
/// construction, malformed input rejected synchronously, and downstream
/// collaborator failures wrapped with the operation that issued them.
#[derive(Debug, Error)]
pub enum Error {
    /// The report codec or transmitter was built for an unsupported contract version.
    #[error("unknown contract version: {0}")]
    UnknownContractVersion(u32),

    /// A plugin type value does not name a known plugin.
    #[error("unknown plugin type: {0}")]
    UnknownPluginType(String),

    /// A coordinator version value does not name a known coordinator.
    #[error("unknown coordinator version: {0}")]
    UnknownCoordinatorVersion(String),

    /// No keystore was supplied to the transmitter.
    #[error("keystore is required")]
    MissingKeystore,

    /// A byte slice had the wrong length for its fixed-size destination.
    #[error("wrong length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// More signatures than the on-chain `rawVs` word can carry.
    #[error("too many signatures, maximum is {max} (got {actual})")]
    TooManySignatures { max: usize, actual: usize },

    /// A signature was not `r || s || v`.
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignature(usize),

    /// The decoded report arrays disagree on the number of requests.
    #[error(
        "report array lengths differ: ids={ids} results={results} errors={errors} \
         onchain_metadata={onchain_metadata} processing_metadata={processing_metadata}"
    )]
    ReportLengthMismatch {
        ids: usize,
        results: usize,
        errors: usize,
        onchain_metadata: usize,
        processing_metadata: usize,
    },

    /// A report carried no requests at all.
    #[error("no requests in report")]
    EmptyReport,

    /// The coordinator field of a processed request is not an address.
    #[error("incorrect length of coordinator contract field: {0}")]
    InvalidCoordinatorContract(usize),

    /// The destination coordinator decoded from a report is the zero address.
    #[error("destination coordinator contract is zero")]
    ZeroCoordinatorContract,

    /// The transmitter has not been routed to a coordinator yet.
    #[error("destination contract address not set")]
    ContractAddressNotSet,

    /// A signer in a contract config is not a 20 byte address.
    #[error("{index}-th evm signer should be a 20 byte address, but got {actual} bytes")]
    InvalidSigner { index: usize, actual: usize },

    /// A transmitter in a contract config is not a 0x-prefixed hex address.
    #[error("{index}-th evm transmitter should be a 42 character Ethereum address string, but got '{value}'")]
    InvalidTransmitter { index: usize, value: String },

    /// No config log exists at the requested block.
    #[error("no config set log found at block {0}")]
    ConfigNotFound(i64),

    /// The log poller reported a negative block height.
    #[error("invalid block height {0}")]
    InvalidBlockHeight(i64),

    /// A log's first topic is not the signature of the event it was parsed as.
    #[error("log is not a {expected} event")]
    UnexpectedEvent { expected: &'static str },

    /// A requested block number is beyond what the log poller can address.
    #[error("block {0} exceeds the log poller's range")]
    BlockOutOfRange(u64),

    /// ABI encoding or decoding failed.
    #[error("abi: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// The log poller failed for a reason other than "not found".
    #[error("{context}: {source}")]
    LogPoller {
        context: String,
        #[source]
        source: LogPollerError,
    },

    /// A chain reader, transaction manager or keystore call failed.
    #[error("{context}: {cause:#}")]
    Downstream { context: String, cause: anyhow::Error },
}

impl Error {
    pub(crate) fn log_poller(context: impl Into<String>, source: LogPollerError) -> Self {
        Self::LogPoller { context: context.into(), source }
    }

    pub(crate) fn downstream(context: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Downstream { context: context.into(), cause }
    }

    /// Describes a filter registration failure for `address`.
    pub(crate) fn filter_registration(name: &str, address: Address, source: LogPollerError) -> Self {
        Self::log_poller(format!("failed to register filter {name} for {address}"), source)
    }
}
