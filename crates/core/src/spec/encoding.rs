//! Helpers for the `0x` prefixed hex strings used throughout the formats

use hex::FromHexError;

pub fn encode_prefixed<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex with or without a leading `0x`
pub fn decode_prefixed(s: &str) -> Result<Vec<u8>, FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

/// Whether the string is exactly `len` lowercase hex characters, with no
/// prefix, which is the form all content digests take
pub fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_optional() {
        assert_eq!(decode_prefixed("0xff00").unwrap(), vec![0xff, 0x00]);
        assert_eq!(decode_prefixed("ff00").unwrap(), vec![0xff, 0x00]);
        assert_eq!(encode_prefixed([0xab]), "0xab");
    }

    #[test]
    fn lower_hex_shape() {
        assert!(is_lower_hex("00ff", 4));
        assert!(!is_lower_hex("00FF", 4));
        assert!(!is_lower_hex("00ff", 6));
    }
}
