//! PSBT Builder - unsigned mint templates
//!
//! A template has exactly two outputs and no inputs. Input selection, change
//! and fee payment are left to the signing wallet; the fee rate is only
//! echoed back to the caller.
//!
//! | vout | value | script |
//! |------|-------|--------|
//! | 0 | 546 sat | recipient taproot address |
//! | 1 | 0 | `OP_RETURN OP_PUSHNUM_13 <protostone payload>` |

use crate::mint::{check_taproot_prefix, MintData, MintError, MintRequest, Network};
use crate::protostone::Runestone;
use bitcoin::address::{Address, AddressType, NetworkUnchecked};
use bitcoin::psbt::Psbt;
use bitcoin::{absolute, transaction, Amount, Transaction, TxOut};
use tracing::debug;

/// Dust-limit value of the recipient output
pub const DUST_LIMIT: Amount = Amount::from_sat(546);

/// Built template plus the fee rate the caller asked for
#[derive(Debug, Clone)]
pub struct MintTemplate {
    psbt: Psbt,
    fee_rate: u64,
}

impl MintTemplate {
    pub fn psbt(&self) -> &Psbt { &self.psbt }
    pub fn fee_rate(&self) -> u64 { self.fee_rate }
    pub fn hex(&self) -> String { self.psbt.serialize_hex() }
}

/// Stateless builder bound to one network
#[derive(Debug, Clone, Copy, Default)]
pub struct PsbtBuilder {
    network: Network,
}

impl PsbtBuilder {
    pub fn new(network: Network) -> Self { Self { network } }

    pub fn network(&self) -> Network { self.network }

    /// Validate raw parameters and build the template
    pub fn build_mint_template(&self, fee_rate: u64, mint_data: &str, recipient: &str) -> Result<MintTemplate, MintError> {
        let request = MintRequest::parse(fee_rate, mint_data, recipient, self.network)?;
        self.build(&request)
    }

    pub fn build(&self, request: &MintRequest) -> Result<MintTemplate, MintError> {
        let address = self.parse_recipient(&request.recipient)?;
        let script = Runestone::for_mint(&request.mint_data)
            .encipher()
            .map_err(|e| MintError::Psbt(e.to_string()))?;

        let tx = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![
                TxOut { value: DUST_LIMIT, script_pubkey: address.script_pubkey() },
                TxOut { value: Amount::ZERO, script_pubkey: script },
            ],
        };
        let psbt = Psbt::from_unsigned_tx(tx).map_err(|e| MintError::Psbt(e.to_string()))?;
        debug!(mint_data = %request.mint_data, fee_rate = request.fee_rate, "built mint template");
        Ok(MintTemplate { psbt, fee_rate: request.fee_rate })
    }

    /// Prefix check, then a full parse that must yield a P2TR address on this network
    fn parse_recipient(&self, recipient: &str) -> Result<Address, MintError> {
        check_taproot_prefix(recipient, self.network)?;
        let invalid = || MintError::InvalidAddress { address: recipient.to_string(), expected: self.network.taproot_prefix() };
        let unchecked: Address<NetworkUnchecked> = recipient.parse().map_err(|_| invalid())?;
        let address = unchecked.require_network(self.network.to_bitcoin()).map_err(|_| invalid())?;
        match address.address_type() {
            Some(AddressType::P2tr) => Ok(address),
            _ => Err(invalid()),
        }
    }
}

/// Mint data carried by the OP_RETURN output of a built template
pub fn template_mint_data(psbt: &Psbt) -> Option<MintData> {
    psbt.unsigned_tx
        .output
        .iter()
        .filter(|out| out.script_pubkey.is_op_return())
        .find_map(|out| Runestone::decipher(&out.script_pubkey).ok()?.mint_data().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAPROOT: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";
    const SEGWIT_V0: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    /// Unsigned tx bytes from the PSBT global map (key 0x00)
    fn unsigned_tx_bytes(hex_psbt: &str) -> Vec<u8> {
        let bytes = hex::decode(hex_psbt).expect("hex");
        assert_eq!(&bytes[..5], b"psbt\xff");
        assert_eq!(&bytes[5..7], &[0x01, 0x00]);
        let len = bytes[7] as usize;
        bytes[8..8 + len].to_vec()
    }

    #[test]
    fn test_template_has_two_outputs_first_dust() {
        let template = PsbtBuilder::default().build_mint_template(10, "2,1,77", TAPROOT).expect("template");
        let tx = unsigned_tx_bytes(&template.hex());
        assert_eq!(tx[4], 0, "no inputs");
        assert_eq!(tx[5], 2, "two outputs");
        assert_eq!(u64::from_le_bytes(tx[6..14].try_into().unwrap()), 546);
        assert_eq!(template.fee_rate(), 10);
    }

    #[test]
    fn test_template_outputs() {
        let template = PsbtBuilder::new(Network::Bitcoin).build_mint_template(3, "2,1,77", TAPROOT).unwrap();
        let outputs = &template.psbt().unsigned_tx.output;
        assert!(template.psbt().unsigned_tx.input.is_empty());
        assert_eq!(outputs[0].value, DUST_LIMIT);
        assert!(outputs[0].script_pubkey.is_p2tr());
        assert_eq!(outputs[1].value, Amount::ZERO);
        assert!(outputs[1].script_pubkey.is_op_return());
        assert_eq!(template_mint_data(template.psbt()), Some(MintData::new(2, 1, 77)));
        assert!(template.hex().starts_with("70736274ff"));
    }

    #[test]
    fn test_invalid_mint_data() {
        let builder = PsbtBuilder::default();
        for raw in ["2,1", "2,1,77,5"] {
            let err = builder.build_mint_template(10, raw, TAPROOT).unwrap_err();
            assert_eq!(err, MintError::InvalidMintData(raw.into()));
        }
    }

    #[test]
    fn test_invalid_address() {
        let builder = PsbtBuilder::default();
        assert!(matches!(builder.build_mint_template(10, "2,1,77", SEGWIT_V0), Err(MintError::InvalidAddress { .. })));
        assert!(matches!(builder.build_mint_template(10, "2,1,77", "bc1pnotanaddress"), Err(MintError::InvalidAddress { .. })));
        let signet = PsbtBuilder::new(Network::Signet);
        assert!(matches!(signet.build_mint_template(10, "2,1,77", TAPROOT), Err(MintError::InvalidAddress { expected: "tb1p", .. })));
    }

    #[test]
    fn test_zero_fee_rate_rejected() {
        let err = PsbtBuilder::default().build_mint_template(0, "2,1,77", TAPROOT).unwrap_err();
        assert_eq!(err, MintError::InvalidFeeRate(0));
    }
}
