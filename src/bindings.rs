//! Compile-time ABI bindings for the Functions coordinator contracts.
//!
//! Only the events and calls this relay touches are declared. Field order
//! and types must match the deployed contracts bit for bit: the event
//! signatures are hashed into topics and the commitment structs are
//! re-encoded into on-chain metadata.

#![allow(missing_docs, clippy::too_many_arguments)]

use alloy_sol_types::sol;

sol! {
    /// OCR2 aggregator surface shared by every coordinator version.
    #[derive(Debug)]
    interface OCR2Base {
        event ConfigSet(
            uint32 previousConfigBlockNumber,
            bytes32 configDigest,
            uint64 configCount,
            address[] signers,
            address[] transmitters,
            uint8 f,
            bytes onchainConfig,
            uint64 offchainConfigVersion,
            bytes offchainConfig
        );

        event Transmitted(bytes32 configDigest, uint32 epoch);

        function transmit(
            bytes32[3] reportContext,
            bytes report,
            bytes32[] rs,
            bytes32[] ss,
            bytes32 rawVs
        ) external;

        function latestConfigDigestAndEpoch()
            external
            view
            returns (bool scanLogs, bytes32 configDigest, uint32 epoch);

        function latestConfigDetails()
            external
            view
            returns (uint32 configCount, uint32 blockNumber, bytes32 configDigest);
    }
}

sol! {
    /// Argument layout of the aggregator's digest helper. Only the
    /// parameter encoding is used; the call is never sent.
    #[derive(Debug)]
    interface OCR2Aggregator {
        function configDigestFromConfigData(
            uint256 _chainId,
            address _contractAddress,
            uint64 _configCount,
            address[] _signers,
            address[] _transmitters,
            uint8 _f,
            bytes _onchainConfig,
            uint64 _encodedConfigVersion,
            bytes _encodedConfig
        ) external pure returns (bytes32);
    }
}

sol! {
    #[derive(Debug)]
    interface FunctionsCoordinatorV1 {
        #[derive(Default)]
        struct Commitment {
            bytes32 requestId;
            address coordinator;
            uint96 estimatedTotalCostJuels;
            address client;
            uint64 subscriptionId;
            uint32 callbackGasLimit;
            uint72 adminFee;
            uint72 donFee;
            uint40 gasOverheadBeforeCallback;
            uint40 gasOverheadAfterCallback;
            uint32 timeoutTimestamp;
        }

        event OracleRequest(
            bytes32 indexed requestId,
            address indexed requestingContract,
            address requestInitiator,
            uint64 subscriptionId,
            address subscriptionOwner,
            bytes data,
            uint16 dataVersion,
            bytes32 flags,
            uint64 callbackGasLimit,
            Commitment commitment
        );

        event OracleResponse(bytes32 indexed requestId, address transmitter);
    }
}

sol! {
    #[derive(Debug)]
    interface FunctionsCoordinatorV2 {
        #[derive(Default)]
        struct Commitment {
            bytes32 requestId;
            address coordinator;
            uint96 estimatedTotalCostJuels;
            address client;
            uint64 subscriptionId;
            uint32 callbackGasLimit;
            uint72 adminFee;
            uint72 donFee;
            uint40 gasOverheadBeforeCallback;
            uint40 gasOverheadAfterCallback;
            uint32 timeoutTimestamp;
            uint72 operationFee;
        }

        event OracleRequest(
            bytes32 indexed requestId,
            address indexed requestingContract,
            address requestInitiator,
            uint64 subscriptionId,
            address subscriptionOwner,
            bytes data,
            uint16 dataVersion,
            bytes32 flags,
            uint64 callbackGasLimit,
            Commitment commitment
        );

        event OracleResponse(bytes32 indexed requestId, address transmitter);
    }
}
