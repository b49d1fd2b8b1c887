//! Protostone codec - Alkanes payload inside a Runestone OP_RETURN
//!
//! ```text
//! MintData (type, action, payload)
//!     │
//!     ▼
//! Cellpack [block, tx, inputs...] ──LEB128──▶ message bytes
//!     │
//!     ▼
//! Protostone {tag: 1, pointer, refund, message}
//!     │  fields as (tag, value) pairs, message in 15-byte chunks
//!     ▼
//! Protostones::encipher ──▶ [tag, len, fields...] ──LEB128──▶ 15-byte u128 chunks
//!     │
//!     ▼
//! Runestone {protocol} ──▶ OP_RETURN OP_PUSHNUM_13 <payload pushes>
//! ```

mod varint;

use crate::mint::MintData;
use bitcoin::blockdata::opcodes;
use bitcoin::blockdata::script::{Builder, Instruction, PushBytesBuf, Script, ScriptBuf};
use thiserror::Error;

pub use varint::{decode_varint_list, encode_varint_list};

/// Alkanes protocol tag inside the Runestone protocol field
pub const ALKANES_PROTOCOL_TAG: u128 = 1;

/// Largest single push allowed in a script
const MAX_PUSH: usize = 520;

/// Bytes packed per u128 so every chunk stays below 2^120
const CHUNK_BYTES: usize = 15;

/// Runestone field tags
pub mod tag {
    pub const BODY: u128 = 0;
    pub const POINTER: u128 = 22;
    pub const PROTOCOL: u128 = 16383;
}

/// Protostone field tags
pub mod protostone_tag {
    pub const MESSAGE: u128 = 81;
    pub const BURN: u128 = 83;
    pub const POINTER: u128 = 91;
    pub const REFUND: u128 = 93;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("varint overflow")]
    VarintOverflow,
    #[error("truncated varint")]
    TruncatedVarint,
    #[error("not a runestone script")]
    NotRunestone,
    #[error("unexpected opcode in runestone payload")]
    UnexpectedOpcode,
    #[error("malformed script: {0}")]
    Script(String),
    #[error("truncated protostone: {0}")]
    Truncated(&'static str),
    #[error("push too large: {0} bytes")]
    PushTooLarge(usize),
}

pub type EncodingResult<T> = Result<T, EncodingError>;

/// Pack bytes into little-endian u128 chunks of `CHUNK_BYTES`
pub fn split_bytes(bytes: &[u8]) -> Vec<u128> {
    bytes
        .chunks(CHUNK_BYTES)
        .map(|chunk| {
            let mut arr = [0u8; 16];
            arr[..chunk.len()].copy_from_slice(chunk);
            u128::from_le_bytes(arr)
        })
        .collect()
}

/// Inverse of `split_bytes`. Trailing zero padding of the last chunk is kept;
/// LEB128 streams are unaffected by it since a zero byte decodes as `0`.
pub fn join_bytes(values: &[u128]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()[..CHUNK_BYTES].to_vec()).collect()
}

/// Contract call: target alkane id plus inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cellpack {
    pub block: u128,
    pub tx: u128,
    pub inputs: Vec<u128>,
}

impl Cellpack {
    pub fn to_vec(&self) -> Vec<u128> {
        let mut values = vec![self.block, self.tx];
        values.extend(&self.inputs);
        values
    }

    pub fn encipher(&self) -> Vec<u8> { encode_varint_list(&self.to_vec()) }

    pub fn from_message(message: &[u8]) -> EncodingResult<Self> {
        let values = decode_varint_list(message)?;
        match values.as_slice() {
            [block, tx, inputs @ ..] => Ok(Self { block: *block, tx: *tx, inputs: trim_padding(inputs) }),
            _ => Err(EncodingError::Truncated("cellpack target")),
        }
    }
}

impl From<&MintData> for Cellpack {
    fn from(data: &MintData) -> Self {
        Self { block: data.kind, tx: data.action, inputs: vec![data.payload] }
    }
}

/// Zero padding from chunk joins decodes as trailing zero inputs
fn trim_padding(inputs: &[u128]) -> Vec<u128> {
    let end = inputs.iter().rposition(|v| *v != 0).map(|i| i + 1).unwrap_or(0);
    inputs[..end].to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Protostone {
    pub protocol_tag: u128,
    pub burn: Option<u128>,
    pub pointer: Option<u32>,
    pub refund: Option<u32>,
    pub message: Vec<u8>,
}

impl Protostone {
    /// Alkanes message protostone; pointer and refund both target output 0
    pub fn mint(cellpack: &Cellpack) -> Self {
        Self {
            protocol_tag: ALKANES_PROTOCOL_TAG,
            burn: None,
            pointer: Some(0),
            refund: Some(0),
            message: cellpack.encipher(),
        }
    }

    pub fn is_message(&self) -> bool { !self.message.is_empty() }

    /// Field stream as (tag, value) pairs
    pub fn to_integers(&self) -> Vec<u128> {
        let mut payload = Vec::new();
        if let Some(burn) = self.burn {
            payload.extend([protostone_tag::BURN, burn]);
        }
        if let Some(pointer) = self.pointer {
            payload.extend([protostone_tag::POINTER, pointer.into()]);
        }
        if let Some(refund) = self.refund {
            payload.extend([protostone_tag::REFUND, refund.into()]);
        }
        for chunk in split_bytes(&self.message) {
            payload.extend([protostone_tag::MESSAGE, chunk]);
        }
        payload
    }

    fn from_integers(protocol_tag: u128, fields: &[u128]) -> EncodingResult<Self> {
        let mut stone = Self { protocol_tag, ..Default::default() };
        let mut chunks = Vec::new();
        for pair in fields.chunks(2) {
            let [field, value] = pair else { return Err(EncodingError::Truncated("field value")) };
            match *field {
                protostone_tag::BURN => stone.burn = Some(*value),
                protostone_tag::POINTER => stone.pointer = Some(narrow(*value)?),
                protostone_tag::REFUND => stone.refund = Some(narrow(*value)?),
                protostone_tag::MESSAGE => chunks.push(*value),
                _ => {}
            }
        }
        stone.message = join_bytes(&chunks);
        Ok(stone)
    }

    /// Decode every protostone packed in a Runestone protocol field
    pub fn decipher_all(protocol: &[u128]) -> EncodingResult<Vec<Protostone>> {
        let values = decode_varint_list(&join_bytes(protocol))?;
        let mut stones = Vec::new();
        let mut rest = values.as_slice();
        while let [protocol_tag, len, tail @ ..] = rest {
            // Padding left by the final chunk shows up as a zero tag
            if *protocol_tag == 0 {
                break;
            }
            let len = usize::try_from(*len).map_err(|_| EncodingError::Truncated("length"))?;
            if tail.len() < len {
                return Err(EncodingError::Truncated("protostone body"));
            }
            stones.push(Self::from_integers(*protocol_tag, &tail[..len])?);
            rest = &tail[len..];
        }
        Ok(stones)
    }
}

fn narrow(value: u128) -> EncodingResult<u32> {
    u32::try_from(value).map_err(|_| EncodingError::VarintOverflow)
}

pub trait Protostones {
    fn encipher(&self) -> Vec<u128>;
}

impl Protostones for [Protostone] {
    fn encipher(&self) -> Vec<u128> {
        let mut values = Vec::new();
        for stone in self {
            let fields = stone.to_integers();
            values.push(stone.protocol_tag);
            values.push(fields.len() as u128);
            values.extend(fields);
        }
        split_bytes(&encode_varint_list(&values))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Runestone {
    pub pointer: Option<u32>,
    pub protocol: Option<Vec<u128>>,
}

impl Runestone {
    pub const MAGIC_NUMBER: opcodes::Opcode = opcodes::all::OP_PUSHNUM_13;

    /// Runestone carrying a single Alkanes mint protostone
    pub fn for_mint(data: &MintData) -> Self {
        let stones = [Protostone::mint(&Cellpack::from(data))];
        Self { pointer: None, protocol: Some(stones.encipher()) }
    }

    fn payload(&self) -> Vec<u8> {
        let mut values = Vec::new();
        if let Some(pointer) = self.pointer {
            values.extend([tag::POINTER, pointer.into()]);
        }
        for value in self.protocol.iter().flatten() {
            values.extend([tag::PROTOCOL, *value]);
        }
        encode_varint_list(&values)
    }

    pub fn encipher(&self) -> EncodingResult<ScriptBuf> {
        let mut builder = Builder::new()
            .push_opcode(opcodes::all::OP_RETURN)
            .push_opcode(Self::MAGIC_NUMBER);
        for chunk in self.payload().chunks(MAX_PUSH) {
            let push = PushBytesBuf::try_from(chunk.to_vec()).map_err(|_| EncodingError::PushTooLarge(chunk.len()))?;
            builder = builder.push_slice(push);
        }
        Ok(builder.into_script())
    }

    pub fn decipher(script: &Script) -> EncodingResult<Self> {
        let mut instructions = script.instructions();
        let mut next_op = || match instructions.next() {
            Some(Ok(Instruction::Op(op))) => Some(op),
            _ => None,
        };
        if next_op() != Some(opcodes::all::OP_RETURN) || next_op() != Some(Self::MAGIC_NUMBER) {
            return Err(EncodingError::NotRunestone);
        }
        let mut payload = Vec::new();
        for instruction in script.instructions().skip(2) {
            match instruction.map_err(|e| EncodingError::Script(e.to_string()))? {
                Instruction::PushBytes(push) => payload.extend_from_slice(push.as_bytes()),
                Instruction::Op(_) => return Err(EncodingError::UnexpectedOpcode),
            }
        }

        let values = decode_varint_list(&payload)?;
        let mut runestone = Runestone::default();
        let mut protocol = Vec::new();
        for pair in values.chunks(2) {
            let [field, value] = pair else { return Err(EncodingError::Truncated("runestone field")) };
            match *field {
                tag::POINTER => runestone.pointer = Some(narrow(*value)?),
                tag::PROTOCOL => protocol.push(*value),
                // Edicts run to the end of the payload
                tag::BODY => break,
                _ => {}
            }
        }
        if !protocol.is_empty() {
            runestone.protocol = Some(protocol);
        }
        Ok(runestone)
    }

    /// Recover mint data from the first Alkanes message protostone
    pub fn mint_data(&self) -> EncodingResult<Option<MintData>> {
        let Some(protocol) = &self.protocol else { return Ok(None) };
        let stones = Protostone::decipher_all(protocol)?;
        let Some(stone) = stones.iter().find(|s| s.protocol_tag == ALKANES_PROTOCOL_TAG && s.is_message()) else {
            return Ok(None);
        };
        let cellpack = Cellpack::from_message(&stone.message)?;
        let payload = cellpack.inputs.first().copied().unwrap_or(0);
        Ok(Some(MintData::new(cellpack.block, cellpack.tx, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join_bytes() {
        let bytes: Vec<u8> = (1..=20).collect();
        let chunks = split_bytes(&bytes);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| *c < (1u128 << 120)));
        let joined = join_bytes(&chunks);
        assert_eq!(&joined[..20], bytes.as_slice());
        assert!(joined[20..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_cellpack_message() {
        let cellpack = Cellpack::from(&MintData::new(2, 1, 77));
        assert_eq!(cellpack.to_vec(), vec![2, 1, 77]);
        assert_eq!(cellpack.encipher(), vec![2, 1, 77]);
        assert_eq!(Cellpack::from_message(&[2, 1, 77, 0, 0]).unwrap(), cellpack);
        assert!(Cellpack::from_message(&[2]).is_err());
    }

    #[test]
    fn test_mint_protostone_fields() {
        let stone = Protostone::mint(&Cellpack::from(&MintData::new(2, 0, 77)));
        assert_eq!(stone.protocol_tag, ALKANES_PROTOCOL_TAG);
        let ints = stone.to_integers();
        assert_eq!(&ints[..4], &[protostone_tag::POINTER, 0, protostone_tag::REFUND, 0]);
        assert_eq!(ints[4], protostone_tag::MESSAGE);
        // message [2, 0, 77] little-endian in one chunk
        assert_eq!(ints[5], 2 | (77 << 16));
        assert_eq!(ints.len(), 6);
    }

    #[test]
    fn test_runestone_script_layout() {
        let script = Runestone::for_mint(&MintData::new(2, 1, 77)).encipher().unwrap();
        let bytes = script.as_bytes();
        assert_eq!(bytes[0], opcodes::all::OP_RETURN.to_u8());
        assert_eq!(bytes[1], opcodes::all::OP_PUSHNUM_13.to_u8());
        assert!(script.is_op_return());
    }

    #[test]
    fn test_runestone_recovers_mint_data() {
        for data in [MintData::new(2, 1, 77), MintData::new(2, 0, 77), MintData::new(840_000, 3, u64::MAX as u128)] {
            let script = Runestone::for_mint(&data).encipher().unwrap();
            let runestone = Runestone::decipher(&script).unwrap();
            assert_eq!(runestone.mint_data().unwrap(), Some(data));
        }
    }

    #[test]
    fn test_decipher_rejects_plain_op_return() {
        let script = Builder::new()
            .push_opcode(opcodes::all::OP_RETURN)
            .push_slice(b"methane")
            .into_script();
        assert_eq!(Runestone::decipher(&script), Err(EncodingError::NotRunestone));
    }

    #[test]
    fn test_runestone_pointer_roundtrip() {
        let runestone = Runestone { pointer: Some(1), protocol: Some(vec![7, 9]) };
        let decoded = Runestone::decipher(&runestone.encipher().unwrap()).unwrap();
        assert_eq!(decoded, runestone);
    }
}
