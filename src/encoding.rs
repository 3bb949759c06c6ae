//! Report codec for batches of processed Functions requests.
//!
//! A report is the ABI parameter encoding of five parallel arrays:
//!
//! ```text
//! (bytes32[] requestIds, bytes[] results, bytes[] errors,
//!  bytes[] onchainMetadata, bytes[] processingMetadata)
//! ```
//!
//! `processingMetadata` carries each request's destination coordinator.
//! The callback gas limit is not part of the report.

use alloy_primitives::{B256, Bytes};
use alloy_sol_types::SolValue;

use crate::error::{Error, Result};
use crate::types::ProcessedRequest;

type ReportArrays = (Vec<B256>, Vec<Bytes>, Vec<Bytes>, Vec<Bytes>, Vec<Bytes>);

/// Converts a slice into a 32-byte word, rejecting any other length.
pub fn slice_to_byte32(data: &[u8]) -> Result<B256> {
    if data.len() != 32 {
        return Err(Error::InvalidLength {
            expected: 32,
            actual: data.len(),
        });
    }
    Ok(B256::from_slice(data))
}

/// Encodes and decodes reports for one coordinator contract version.
#[derive(Debug, Clone, Copy)]
pub struct ReportCodec {
    contract_version: u32,
}

impl ReportCodec {
    pub fn new(contract_version: u32) -> Result<Self> {
        match contract_version {
            1 => Ok(Self { contract_version }),
            other => Err(Error::UnknownContractVersion(other)),
        }
    }

    pub fn contract_version(&self) -> u32 {
        self.contract_version
    }

    pub fn encode_report(&self, requests: &[ProcessedRequest]) -> Result<Bytes> {
        if requests.is_empty() {
            return Ok(Bytes::new());
        }

        let mut ids = Vec::with_capacity(requests.len());
        let mut results = Vec::with_capacity(requests.len());
        let mut errors = Vec::with_capacity(requests.len());
        let mut onchain_metadata = Vec::with_capacity(requests.len());
        let mut processing_metadata = Vec::with_capacity(requests.len());

        for request in requests {
            ids.push(slice_to_byte32(&request.request_id)?);
            results.push(request.result.clone());
            errors.push(request.error.clone());
            onchain_metadata.push(request.onchain_metadata.clone());
            processing_metadata.push(request.coordinator_contract.clone());
        }

        let arrays: ReportArrays = (ids, results, errors, onchain_metadata, processing_metadata);
        Ok(arrays.abi_encode_params().into())
    }

    pub fn decode_report(&self, raw: &[u8]) -> Result<Vec<ProcessedRequest>> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let (ids, results, errors, onchain_metadata, processing_metadata) =
            <ReportArrays as SolValue>::abi_decode_params(raw, true)?;

        let n = ids.len();
        if results.len() != n
            || errors.len() != n
            || onchain_metadata.len() != n
            || processing_metadata.len() != n
        {
            return Err(Error::ReportLengthMismatch {
                ids: n,
                results: results.len(),
                errors: errors.len(),
                onchain_metadata: onchain_metadata.len(),
                processing_metadata: processing_metadata.len(),
            });
        }

        let requests = ids
            .into_iter()
            .zip(results)
            .zip(errors)
            .zip(onchain_metadata)
            .zip(processing_metadata)
            .map(
                |((((id, result), error), onchain_metadata), coordinator_contract)| ProcessedRequest {
                    request_id: Bytes::copy_from_slice(id.as_slice()),
                    result,
                    error,
                    onchain_metadata,
                    coordinator_contract,
                    callback_gas_limit: 0,
                },
            )
            .collect();

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn request(id: u8, coordinator: Address) -> ProcessedRequest {
        ProcessedRequest {
            request_id: Bytes::from(vec![id; 32]),
            result: Bytes::from_static(b"abcd"),
            error: Bytes::new(),
            onchain_metadata: Bytes::from_static(b"commitment"),
            coordinator_contract: Bytes::copy_from_slice(coordinator.as_slice()),
            callback_gas_limit: 0,
        }
    }

    #[test]
    fn rejects_unknown_contract_version() {
        assert!(matches!(
            ReportCodec::new(2),
            Err(Error::UnknownContractVersion(2))
        ));
        assert!(ReportCodec::new(0).is_err());
    }

    #[test]
    fn encodes_and_decodes_a_batch() {
        let codec = ReportCodec::new(1).unwrap();
        let mut second = request(2, Address::repeat_byte(0x22));
        second.result = Bytes::new();
        second.error = Bytes::from_static(b"timeout");
        let requests = vec![request(1, Address::repeat_byte(0x11)), second];

        let encoded = codec.encode_report(&requests).unwrap();
        let decoded = codec.decode_report(&encoded).unwrap();

        assert_eq!(decoded, requests);
    }

    #[test]
    fn callback_gas_limit_is_not_serialized() {
        let codec = ReportCodec::new(1).unwrap();
        let mut req = request(9, Address::repeat_byte(0x33));
        req.callback_gas_limit = 300_000;

        let decoded = codec
            .decode_report(&codec.encode_report(&[req.clone()]).unwrap())
            .unwrap();

        assert_eq!(decoded[0].callback_gas_limit, 0);
        assert_eq!(decoded[0].request_id, req.request_id);
        assert_eq!(decoded[0].coordinator_contract, req.coordinator_contract);
    }

    #[test]
    fn empty_batch_is_empty_bytes() {
        let codec = ReportCodec::new(1).unwrap();
        let encoded = codec.encode_report(&[]).unwrap();
        assert!(encoded.is_empty());
        assert!(codec.decode_report(&encoded).unwrap().is_empty());
    }

    #[test]
    fn encode_rejects_short_request_id() {
        let codec = ReportCodec::new(1).unwrap();
        let mut req = request(1, Address::repeat_byte(0x11));
        req.request_id = Bytes::from_static(&[1, 2, 3, 4]);

        assert!(matches!(
            codec.encode_report(&[req]),
            Err(Error::InvalidLength {
                expected: 32,
                actual: 4
            })
        ));
    }

    #[test]
    fn decode_rejects_mismatched_arrays() {
        let codec = ReportCodec::new(1).unwrap();
        let arrays: ReportArrays = (
            vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            vec![Bytes::new(), Bytes::new()],
            vec![Bytes::new()],
            vec![Bytes::new(), Bytes::new()],
            vec![Bytes::new(), Bytes::new()],
        );
        let raw = arrays.abi_encode_params();

        assert!(matches!(
            codec.decode_report(&raw),
            Err(Error::ReportLengthMismatch { ids: 2, errors: 1, .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        let codec = ReportCodec::new(1).unwrap();
        assert!(matches!(
            codec.decode_report(&[0xde, 0xad, 0xbe, 0xef]),
            Err(Error::Abi(_))
        ));
    }

    #[test]
    fn slice_to_byte32_checks_length() {
        assert!(slice_to_byte32(&[0u8; 4]).is_err());
        assert!(slice_to_byte32(&[0u8; 40]).is_err());

        let input: Vec<u8> = (0..32).collect();
        let word = slice_to_byte32(&input).unwrap();
        assert_eq!(word.as_slice(), input.as_slice());
    }
}
