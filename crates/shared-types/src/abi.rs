//! # ABI Word Codec
//!
//! Minimal Solidity ABI support for the types the committee contracts use:
//! `address`, `uint256`, `uint8`, `bool`, `bytes32` and `string`.
//!
//! Every value occupies one 32-byte head word. `string` is dynamic: its head
//! word is an offset into the tail, where a length word precedes the padded
//! bytes.

use sha3::{Digest, Keccak256};

use crate::entities::{Address, Hash, U256};
use crate::errors::AbiError;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Declared type of an ABI parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    Address,
    Uint256,
    Uint8,
    Bool,
    Bytes32,
    String,
}

impl AbiType {
    /// Canonical Solidity name, as used in signatures.
    #[must_use]
    pub fn solidity_name(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
            AbiType::Uint8 => "uint8",
            AbiType::Bool => "bool",
            AbiType::Bytes32 => "bytes32",
            AbiType::String => "string",
        }
    }

    /// Whether the value lives in the tail section.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiType::String)
    }
}

/// A decoded (or to-be-encoded) ABI value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes32(Hash),
    String(String),
}

impl AbiValue {
    /// Short type name for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Uint(_) => "uint",
            AbiValue::Bool(_) => "bool",
            AbiValue::Bytes32(_) => "bytes32",
            AbiValue::String(_) => "string",
        }
    }

    fn mismatch(&self, expected: &'static str) -> AbiError {
        AbiError::TypeMismatch {
            expected,
            actual: self.kind_name(),
        }
    }

    pub fn as_address(&self) -> Result<Address, AbiError> {
        match self {
            AbiValue::Address(a) => Ok(*a),
            other => Err(other.mismatch("address")),
        }
    }

    pub fn as_uint(&self) -> Result<U256, AbiError> {
        match self {
            AbiValue::Uint(v) => Ok(*v),
            other => Err(other.mismatch("uint")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, AbiError> {
        match self {
            AbiValue::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_bytes32(&self) -> Result<Hash, AbiError> {
        match self {
            AbiValue::Bytes32(h) => Ok(*h),
            other => Err(other.mismatch("bytes32")),
        }
    }

    /// String value. A `bytes32` is accepted and decoded as trimmed UTF-8.
    pub fn as_string(&self) -> Result<String, AbiError> {
        match self {
            AbiValue::String(s) => Ok(s.clone()),
            AbiValue::Bytes32(h) => Ok(bytes32_to_utf8(h)),
            other => Err(other.mismatch("string")),
        }
    }
}

/// Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::from_slice(&Keccak256::digest(data))
}

/// Canonical signature, e.g. `balanceOf(address)`.
#[must_use]
pub fn signature(name: &str, inputs: &[AbiType]) -> String {
    let params: Vec<&str> = inputs.iter().map(AbiType::solidity_name).collect();
    format!("{}({})", name, params.join(","))
}

/// 4-byte function selector of a signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

/// Decode a `bytes32` holding right-padded UTF-8 text.
#[must_use]
pub fn bytes32_to_utf8(value: &Hash) -> String {
    let bytes = value.as_bytes();
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Right-pad UTF-8 text into a `bytes32` (truncating past 32 bytes).
#[must_use]
pub fn utf8_to_bytes32(text: &str) -> Hash {
    let mut out = [0u8; WORD];
    let bytes = text.as_bytes();
    let len = bytes.len().min(WORD);
    out[..len].copy_from_slice(&bytes[..len]);
    Hash::from(out)
}

fn encode_static(value: &AbiValue) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match value {
        AbiValue::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
        AbiValue::Uint(v) => v.to_big_endian(&mut word),
        AbiValue::Bool(b) => word[31] = u8::from(*b),
        AbiValue::Bytes32(h) => word.copy_from_slice(h.as_bytes()),
        AbiValue::String(_) => {}
    }
    word
}

/// ABI-encode `values` as a parameter tuple.
#[must_use]
pub fn encode(values: &[AbiValue]) -> Vec<u8> {
    let mut head = Vec::with_capacity(values.len() * WORD);
    let mut tail = Vec::new();
    let head_len = values.len() * WORD;

    for value in values {
        if let AbiValue::String(s) = value {
            let offset = U256::from(head_len + tail.len());
            head.extend_from_slice(&encode_static(&AbiValue::Uint(offset)));
            tail.extend_from_slice(&encode_static(&AbiValue::Uint(U256::from(s.len()))));
            tail.extend_from_slice(s.as_bytes());
            let padding = (WORD - s.len() % WORD) % WORD;
            tail.extend(std::iter::repeat(0u8).take(padding));
        } else {
            head.extend_from_slice(&encode_static(value));
        }
    }

    head.extend(tail);
    head
}

/// Selector followed by the encoded arguments.
#[must_use]
pub fn encode_call(signature: &str, args: &[AbiValue]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode(args));
    data
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    data.get(offset..offset + WORD).ok_or(AbiError::OutOfBounds {
        offset,
        needed: WORD,
        available: data.len(),
    })
}

fn word_to_usize(word: &[u8], kind: &'static str) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return Err(AbiError::InvalidWord {
            kind,
            reason: format!("{value} is out of range"),
        });
    }
    Ok(value.as_usize())
}

/// Decode one static word.
pub fn decode_word(kind: AbiType, word: &[u8]) -> Result<AbiValue, AbiError> {
    if word.len() != WORD {
        return Err(AbiError::OutOfBounds {
            offset: 0,
            needed: WORD,
            available: word.len(),
        });
    }
    match kind {
        AbiType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidWord {
                    kind: "address",
                    reason: "dirty high bytes".into(),
                });
            }
            Ok(AbiValue::Address(Address::from_slice(&word[12..])))
        }
        AbiType::Uint256 => Ok(AbiValue::Uint(U256::from_big_endian(word))),
        AbiType::Uint8 => {
            let value = U256::from_big_endian(word);
            if value > U256::from(u8::MAX) {
                return Err(AbiError::InvalidWord {
                    kind: "uint8",
                    reason: format!("{value} does not fit"),
                });
            }
            Ok(AbiValue::Uint(value))
        }
        AbiType::Bool => {
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(AbiError::InvalidWord {
                    kind: "bool",
                    reason: "not 0 or 1".into(),
                });
            }
            Ok(AbiValue::Bool(word[31] == 1))
        }
        AbiType::Bytes32 => Ok(AbiValue::Bytes32(Hash::from_slice(word))),
        // Indexed dynamic values are stored as their hash.
        AbiType::String => Ok(AbiValue::Bytes32(Hash::from_slice(word))),
    }
}

/// Decode a parameter tuple.
pub fn decode(kinds: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let head = word_at(data, i * WORD)?;
            if !kind.is_dynamic() {
                return decode_word(*kind, head);
            }
            let offset = word_to_usize(head, "offset")?;
            let len = word_to_usize(word_at(data, offset)?, "length")?;
            let start = offset + WORD;
            let bytes = data.get(start..start + len).ok_or(AbiError::OutOfBounds {
                offset: start,
                needed: len,
                available: data.len(),
            })?;
            let text = std::str::from_utf8(bytes).map_err(|_| AbiError::InvalidUtf8)?;
            Ok(AbiValue::String(text.to_string()))
        })
        .collect()
}

/// Parse a `0x`-prefixed hex string into bytes.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(trimmed).map_err(|e| AbiError::InvalidWord {
        kind: "hex",
        reason: e.to_string(),
    })
}

/// Render bytes as a `0x`-prefixed hex string.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_topic_matches_erc20() {
        let sig = signature("Transfer", &[AbiType::Address, AbiType::Address, AbiType::Uint256]);
        assert_eq!(sig, "Transfer(address,address,uint256)");
        assert_eq!(
            encode_hex(keccak256(sig.as_bytes()).as_bytes()),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_balance_of_selector() {
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_decode_mixed_tuple_with_string() {
        let values = vec![
            AbiValue::Address(Address::from_low_u64_be(0xA)),
            AbiValue::Bytes32(utf8_to_bytes32("Finance")),
            AbiValue::String("Handles the budget".into()),
            AbiValue::Bool(true),
        ];
        let data = encode(&values);
        let kinds = [AbiType::Address, AbiType::Bytes32, AbiType::String, AbiType::Bool];
        let decoded = decode(&kinds, &data).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(decoded[1].as_string().unwrap(), "Finance");
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let err = decode(&[AbiType::Uint256, AbiType::Uint256], &[0u8; 40]).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { offset: 32, .. }));
    }

    #[test]
    fn test_decode_rejects_dirty_address() {
        let mut word = [0u8; WORD];
        word[0] = 1;
        assert!(decode_word(AbiType::Address, &word).is_err());
    }

    #[test]
    fn test_decode_rejects_bool_out_of_range() {
        let mut word = [0u8; WORD];
        word[31] = 2;
        assert!(decode_word(AbiType::Bool, &word).is_err());
    }

    #[test]
    fn test_bytes32_text_is_trimmed() {
        assert_eq!(bytes32_to_utf8(&utf8_to_bytes32("Board")), "Board");
        assert_eq!(bytes32_to_utf8(&Hash::zero()), "");
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let err = AbiValue::Bool(true).as_address().unwrap_err();
        assert_eq!(
            err,
            AbiError::TypeMismatch {
                expected: "address",
                actual: "bool"
            }
        );
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(decode_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(encode_hex(&[0xff]), "0xff");
        assert!(decode_hex("0xzz").is_err());
    }
}
