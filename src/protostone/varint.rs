//! LEB128 varint streams

use super::{EncodingError, EncodingResult};
use ordinals::varint;

/// returns the values in a LEB encoded stream
pub fn encode_varint_list(values: &[u128]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        varint::encode_to_vec(*value, &mut out);
    }
    out
}

pub fn decode_varint_list(mut bytes: &[u8]) -> EncodingResult<Vec<u128>> {
    let mut values = Vec::new();
    while !bytes.is_empty() {
        let (value, size) = varint::decode(bytes).map_err(|err| match err {
            varint::Error::Unterminated => EncodingError::TruncatedVarint,
            _ => EncodingError::VarintOverflow,
        })?;
        values.push(value);
        bytes = &bytes[size..];
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cellpack_stream() {
        let bytes = encode_varint_list(&[2, 1, 77]);
        assert_eq!(bytes, vec![0x02, 0x01, 0x4d]);
        assert_eq!(decode_varint_list(&bytes).unwrap(), vec![2, 1, 77]);
    }

    #[test]
    fn test_truncated_stream() {
        let mut bytes = encode_varint_list(&[16383]);
        bytes.push(0x80);
        assert_eq!(decode_varint_list(&bytes), Err(EncodingError::TruncatedVarint));
    }
}
