//! Config digests for the OCR2 aggregator family.
//!
//! A digest is `keccak256(abi.encode(configDigestFromConfigData args))` with
//! its first two bytes replaced by the plugin's prefix. The prefix is what
//! tells apart plugins sharing one contract with otherwise identical config.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Deserializer};

use crate::bindings::OCR2Aggregator::configDigestFromConfigDataCall;
use crate::error::{Error, Result};
use crate::types::ContractConfig;

const EVM_ADDRESS_LEN: usize = 20;

/// Digest prefix shared with the generic EVM aggregator.
pub const FUNCTIONS_DIGEST_PREFIX: u16 = 0x0001;
pub const THRESHOLD_DIGEST_PREFIX: u16 = 0x0007;
pub const S4_DIGEST_PREFIX: u16 = 0x0008;

/// The OCR2 plugins that share a Functions coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PluginType {
    #[default]
    Functions,
    Threshold,
    S4,
}

impl PluginType {
    pub fn digest_prefix(self) -> u16 {
        match self {
            Self::Functions => FUNCTIONS_DIGEST_PREFIX,
            Self::Threshold => THRESHOLD_DIGEST_PREFIX,
            Self::S4 => S4_DIGEST_PREFIX,
        }
    }
}

impl TryFrom<u8> for PluginType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Functions),
            1 => Ok(Self::Threshold),
            2 => Ok(Self::S4),
            other => Err(Error::UnknownPluginType(other.to_string())),
        }
    }
}

impl FromStr for PluginType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "functions" => Ok(Self::Functions),
            "threshold" => Ok(Self::Threshold),
            "s4" => Ok(Self::S4),
            other => other
                .parse::<u8>()
                .map_err(|_| Error::UnknownPluginType(s.to_string()))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Functions => f.write_str("functions"),
            Self::Threshold => f.write_str("threshold"),
            Self::S4 => f.write_str("s4"),
        }
    }
}

impl<'de> Deserialize<'de> for PluginType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Overwrites the first two bytes of `digest` with `prefix`, big endian.
pub fn apply_digest_prefix(digest: &mut B256, prefix: u16) {
    digest.0[..2].copy_from_slice(&prefix.to_be_bytes());
}

/// Computes the digest the aggregator would report for this configuration.
#[allow(clippy::too_many_arguments)]
pub fn config_digest(
    plugin_type: PluginType,
    chain_id: U256,
    contract_address: Address,
    config_count: u64,
    signers: Vec<Address>,
    transmitters: Vec<Address>,
    f: u8,
    onchain_config: Bytes,
    offchain_config_version: u64,
    offchain_config: Bytes,
) -> B256 {
    let call = configDigestFromConfigDataCall {
        _chainId: chain_id,
        _contractAddress: contract_address,
        _configCount: config_count,
        _signers: signers,
        _transmitters: transmitters,
        _f: f,
        _onchainConfig: onchain_config,
        _encodedConfigVersion: offchain_config_version,
        _encodedConfig: offchain_config,
    };
    // Only the arguments are hashed, not the selector.
    let encoded = call.abi_encode();
    let mut digest = keccak256(&encoded[4..]);
    apply_digest_prefix(&mut digest, plugin_type.digest_prefix());
    digest
}

/// Computes digests for a single coordinator contract.
#[derive(Debug, Clone, Copy)]
pub struct OffchainConfigDigester {
    pub plugin_type: PluginType,
    pub chain_id: U256,
    pub contract_address: Address,
}

impl OffchainConfigDigester {
    pub fn new(plugin_type: PluginType, chain_id: U256, contract_address: Address) -> Self {
        Self {
            plugin_type,
            chain_id,
            contract_address,
        }
    }

    pub fn config_digest(&self, config: &ContractConfig) -> Result<B256> {
        let signers = config
            .signers
            .iter()
            .enumerate()
            .map(|(index, signer)| {
                if signer.len() != EVM_ADDRESS_LEN {
                    return Err(Error::InvalidSigner {
                        index,
                        actual: signer.len(),
                    });
                }
                Ok(Address::from_slice(signer))
            })
            .collect::<Result<Vec<_>>>()?;

        let transmitters = config
            .transmitters
            .iter()
            .enumerate()
            .map(|(index, transmitter)| parse_transmitter(index, transmitter))
            .collect::<Result<Vec<_>>>()?;

        Ok(config_digest(
            self.plugin_type,
            self.chain_id,
            self.contract_address,
            config.config_count,
            signers,
            transmitters,
            config.f,
            config.onchain_config.clone(),
            config.offchain_config_version,
            config.offchain_config.clone(),
        ))
    }

    pub fn config_digest_prefix(&self) -> u16 {
        self.plugin_type.digest_prefix()
    }
}

fn parse_transmitter(index: usize, value: &str) -> Result<Address> {
    let invalid = || Error::InvalidTransmitter {
        index,
        value: value.to_string(),
    };
    if !value.starts_with("0x") || value.len() != 42 {
        return Err(invalid());
    }
    value.parse::<Address>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_for(plugin_type: PluginType) -> B256 {
        config_digest(
            plugin_type,
            U256::from(1337u64),
            Address::repeat_byte(0x42),
            3,
            vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            vec![Address::repeat_byte(3), Address::repeat_byte(4)],
            1,
            Bytes::from_static(b"onchain"),
            30,
            Bytes::from_static(b"offchain"),
        )
    }

    #[test]
    fn prefixes_differ_only_in_first_two_bytes() {
        let functions = digest_for(PluginType::Functions);
        let threshold = digest_for(PluginType::Threshold);
        let s4 = digest_for(PluginType::S4);

        assert_eq!(&functions[..2], &[0x00, 0x01]);
        assert_eq!(&threshold[..2], &[0x00, 0x07]);
        assert_eq!(&s4[..2], &[0x00, 0x08]);

        assert_eq!(functions[2..], threshold[2..]);
        assert_eq!(functions[2..], s4[2..]);
        assert_ne!(functions, threshold);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest_for(PluginType::Functions), digest_for(PluginType::Functions));
    }

    #[test]
    fn unknown_plugin_type_is_an_error() {
        assert!(matches!(PluginType::try_from(3), Err(Error::UnknownPluginType(_))));
        assert!("mercury".parse::<PluginType>().is_err());
        assert!("255".parse::<PluginType>().is_err());
        assert_eq!("S4".parse::<PluginType>().unwrap(), PluginType::S4);
        assert_eq!("1".parse::<PluginType>().unwrap(), PluginType::Threshold);
    }

    #[test]
    fn digester_matches_free_function() {
        let digester =
            OffchainConfigDigester::new(PluginType::Threshold, U256::from(1337u64), Address::repeat_byte(0x42));
        let config = ContractConfig {
            config_count: 3,
            signers: vec![
                Bytes::copy_from_slice(Address::repeat_byte(1).as_slice()),
                Bytes::copy_from_slice(Address::repeat_byte(2).as_slice()),
            ],
            transmitters: vec![
                Address::repeat_byte(3).to_string(),
                Address::repeat_byte(4).to_string(),
            ],
            f: 1,
            onchain_config: Bytes::from_static(b"onchain"),
            offchain_config_version: 30,
            offchain_config: Bytes::from_static(b"offchain"),
            ..Default::default()
        };

        assert_eq!(digester.config_digest(&config).unwrap(), digest_for(PluginType::Threshold));
        assert_eq!(digester.config_digest_prefix(), THRESHOLD_DIGEST_PREFIX);
    }

    #[test]
    fn digester_rejects_bad_accounts() {
        let digester = OffchainConfigDigester::new(PluginType::Functions, U256::from(1u64), Address::ZERO);

        let bad_signer = ContractConfig {
            signers: vec![Bytes::from_static(&[1, 2, 3])],
            ..Default::default()
        };
        assert!(matches!(
            digester.config_digest(&bad_signer),
            Err(Error::InvalidSigner { index: 0, actual: 3 })
        ));

        let bad_transmitter = ContractConfig {
            transmitters: vec!["1234".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            digester.config_digest(&bad_transmitter),
            Err(Error::InvalidTransmitter { index: 0, .. })
        ));
    }

    #[test]
    fn apply_prefix_overwrites_leading_bytes() {
        let mut digest = B256::repeat_byte(0xff);
        apply_digest_prefix(&mut digest, S4_DIGEST_PREFIX);
        assert_eq!(&digest[..3], &[0x00, 0x08, 0xff]);
    }
}
