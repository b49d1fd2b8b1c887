//! Mint request model - what a caller asks the builder for
//!
//! A mint is three protocol integers `(type, action, payload)` carried on the
//! wire as `"T,A,P"`, a fee rate in sat/vB, and a taproot recipient.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mint data used when a caller does not supply any
pub const DEFAULT_MINT_DATA: &str = "2,1,77";

/// Builder-side validation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("Invalid mint data format: {0}. Expected format: \"2,1,77\"")]
    InvalidMintData(String),
    #[error("Invalid taproot address: {address}. Address starting with {expected}... required.")]
    InvalidAddress { address: String, expected: &'static str },
    #[error("Invalid fee rate: {0}. Fee rate must be a positive integer (sat/vB)")]
    InvalidFeeRate(u64),
    #[error("Missing required parameters. Please provide feeRate, mintData, and userAddress.")]
    MissingParameters,
    #[error("PSBT construction failed: {0}")]
    Psbt(String),
}

impl MintError {
    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MintError::Psbt(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network { #[default] Bitcoin, Testnet, Signet, Regtest }

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self { Network::Bitcoin => "bitcoin", Network::Testnet => "testnet", Network::Signet => "signet", Network::Regtest => "regtest" }
    }

    /// Human-readable prefix of a taproot (segwit v1) address on this network
    pub fn taproot_prefix(&self) -> &'static str {
        match self { Network::Bitcoin => "bc1p", Network::Testnet | Network::Signet => "tb1p", Network::Regtest => "bcrt1p" }
    }

    #[cfg(feature = "bitcoin")]
    pub fn to_bitcoin(&self) -> bitcoin::Network {
        match self { Network::Bitcoin => bitcoin::Network::Bitcoin, Network::Testnet => bitcoin::Network::Testnet, Network::Signet => bitcoin::Network::Signet, Network::Regtest => bitcoin::Network::Regtest }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// The protocol 3-tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintData {
    pub kind: u128,
    pub action: u128,
    pub payload: u128,
}

impl MintData {
    pub fn new(kind: u128, action: u128, payload: u128) -> Self { Self { kind, action, payload } }
}

impl Default for MintData {
    fn default() -> Self { Self::new(2, 1, 77) }
}

impl FromStr for MintData {
    type Err = MintError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || MintError::InvalidMintData(raw.to_string());
        let parts = raw
            .split(',')
            .map(|part| part.trim().parse::<u128>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [kind, action, payload] => Ok(Self::new(*kind, *action, *payload)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for MintData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.kind, self.action, self.payload)
    }
}

/// A validated mint request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub fee_rate: u64,
    pub mint_data: MintData,
    pub recipient: String,
}

impl MintRequest {
    /// Validate raw wire parameters against `network`.
    ///
    /// The address check here is the prefix check only; the builder parses
    /// the address fully before placing the output.
    pub fn parse(fee_rate: u64, mint_data: &str, recipient: &str, network: Network) -> Result<Self, MintError> {
        if fee_rate == 0 {
            return Err(MintError::InvalidFeeRate(fee_rate));
        }
        let mint_data = mint_data.parse::<MintData>()?;
        check_taproot_prefix(recipient, network)?;
        Ok(Self { fee_rate, mint_data, recipient: recipient.to_string() })
    }
}

pub(crate) fn check_taproot_prefix(address: &str, network: Network) -> Result<(), MintError> {
    let expected = network.taproot_prefix();
    let has_prefix = address
        .get(..expected.len())
        .map(|head| head.eq_ignore_ascii_case(expected))
        .unwrap_or(false);
    if has_prefix && address.len() > expected.len() {
        Ok(())
    } else {
        Err(MintError::InvalidAddress { address: address.to_string(), expected })
    }
}

/// Wire body of `POST /api/create-mint-psbt`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPsbtRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<String>,
}

impl MintPsbtRequest {
    pub fn new(fee_rate: u64, mint_data: &MintData, user_address: impl Into<String>) -> Self {
        Self { fee_rate: Some(fee_rate), mint_data: Some(mint_data.to_string()), user_address: Some(user_address.into()) }
    }

    /// Reject absent or empty parameters, then validate
    pub fn validate(&self, network: Network) -> Result<MintRequest, MintError> {
        let fee_rate = self.fee_rate.ok_or(MintError::MissingParameters)?;
        let mint_data = self.mint_data.as_deref().filter(|s| !s.trim().is_empty()).ok_or(MintError::MissingParameters)?;
        let address = self.user_address.as_deref().filter(|s| !s.trim().is_empty()).ok_or(MintError::MissingParameters)?;
        MintRequest::parse(fee_rate, mint_data, address, network)
    }
}

/// Wire body returned by `POST /api/create-mint-psbt`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPsbtResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psbt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MintPsbtResponse {
    pub fn ok(psbt: String, fee_rate: u64) -> Self {
        Self {
            success: true,
            psbt: Some(psbt),
            format: Some(crate::core::paths::api::PSBT_FORMAT.to_string()),
            fee_rate: Some(fee_rate),
            message: Some("PSBT created. Sign it with your wallet.".to_string()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, psbt: None, format: None, fee_rate: None, message: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAPROOT: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";

    #[test]
    fn test_mint_data_parses_three_integers() {
        let data: MintData = " 2, 1 ,77".parse().expect("valid");
        assert_eq!(data, MintData::new(2, 1, 77));
        assert_eq!(data.to_string(), "2,1,77");
        assert_eq!(DEFAULT_MINT_DATA.parse::<MintData>().unwrap(), MintData::default());
    }

    #[test]
    fn test_mint_data_rejects_wrong_arity() {
        for raw in ["2,1", "2,1,77,5", "", "2,,77", "2,1,-77", "a,b,c", "2,1,7.5"] {
            assert_eq!(raw.parse::<MintData>(), Err(MintError::InvalidMintData(raw.into())), "{raw}");
        }
    }

    #[test]
    fn test_taproot_prefix_per_network() {
        assert!(check_taproot_prefix(TAPROOT, Network::Bitcoin).is_ok());
        assert!(check_taproot_prefix(&TAPROOT.to_uppercase(), Network::Bitcoin).is_ok());
        assert!(check_taproot_prefix("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Network::Bitcoin).is_err());
        assert!(check_taproot_prefix(TAPROOT, Network::Signet).is_err());
        assert!(check_taproot_prefix("bc1p", Network::Bitcoin).is_err());
        assert!(check_taproot_prefix("bcrt1pxyz", Network::Regtest).is_ok());
    }

    #[test]
    fn test_request_validation_order() {
        assert_eq!(MintRequest::parse(0, "2,1,77", TAPROOT, Network::Bitcoin), Err(MintError::InvalidFeeRate(0)));
        assert!(matches!(MintRequest::parse(5, "2,1", TAPROOT, Network::Bitcoin), Err(MintError::InvalidMintData(_))));
        assert!(matches!(MintRequest::parse(5, "2,1,77", "1BoatSLRHtKNngkdXEeobR76b53LETtpyT", Network::Bitcoin), Err(MintError::InvalidAddress { .. })));
        let req = MintRequest::parse(5, "2,1,77", TAPROOT, Network::Bitcoin).expect("valid");
        assert_eq!(req.fee_rate, 5);
        assert_eq!(req.mint_data, MintData::new(2, 1, 77));
    }

    #[test]
    fn test_wire_request_missing_fields() {
        let body: MintPsbtRequest = serde_json::from_str(r#"{"feeRate": 10, "mintData": "2,1,77"}"#).unwrap();
        assert_eq!(body.validate(Network::Bitcoin), Err(MintError::MissingParameters));

        let body: MintPsbtRequest = serde_json::from_str(&format!(r#"{{"feeRate": 10, "mintData": " ", "userAddress": "{TAPROOT}"}}"#)).unwrap();
        assert_eq!(body.validate(Network::Bitcoin), Err(MintError::MissingParameters));

        let body = MintPsbtRequest::new(10, &MintData::default(), TAPROOT);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mintData"], "2,1,77");
        assert_eq!(json["userAddress"], TAPROOT);
        assert!(body.validate(Network::Bitcoin).is_ok());
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse::<Network>(), Ok(Network::Bitcoin));
        assert_eq!(" Signet ".parse::<Network>(), Ok(Network::Signet));
        assert!("litecoin".parse::<Network>().is_err());
        assert_eq!(Network::Regtest.taproot_prefix(), "bcrt1p");
    }

    #[test]
    fn test_wire_response_shapes() {
        let ok = serde_json::to_value(MintPsbtResponse::ok("70736274ff".into(), 7)).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["format"], "hex");
        assert_eq!(ok["feeRate"], 7);
        let failed = serde_json::to_value(MintPsbtResponse::failure("nope")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "nope"}));
    }
}
