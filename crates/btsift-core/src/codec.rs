//! Fixed-key XOR obfuscation applied by device firmware to ATT values.
//!
//! The transform is its own inverse, so `encode` and `decode` are the same
//! operation; both names exist so call sites read in the right direction.

use serde::{Deserialize, Serialize};

/// Key observed in all captured device traffic.
pub const DEFAULT_XOR_KEY: u8 = 0xFF;

/// Stateless single-byte XOR codec.
///
/// # Examples
/// ```
/// use btsift_core::XorCodec;
///
/// let codec = XorCodec::default();
/// let wire = codec.encode(&[0x2A, 0x00]);
/// assert_eq!(wire, vec![0xD5, 0xFF]);
/// assert_eq!(codec.decode(&wire), vec![0x2A, 0x00]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XorCodec {
    pub key: u8,
}

impl Default for XorCodec {
    fn default() -> Self {
        Self::new(DEFAULT_XOR_KEY)
    }
}

impl XorCodec {
    pub const fn new(key: u8) -> Self {
        Self { key }
    }

    pub fn encode(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|b| b ^ self.key).collect()
    }

    pub fn decode(&self, bytes: &[u8]) -> Vec<u8> {
        self.encode(bytes)
    }

    pub fn apply_in_place(&self, bytes: &mut [u8]) {
        for b in bytes {
            *b ^= self.key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::XorCodec;

    #[test]
    fn involution_over_every_byte_and_key() {
        let all: Vec<u8> = (0..=255).collect();
        for key in 0..=255u8 {
            let codec = XorCodec::new(key);
            assert_eq!(codec.decode(&codec.encode(&all)), all);
            assert_eq!(codec.encode(&codec.encode(&all)), all);
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(XorCodec::default().decode(&[]).is_empty());
    }

    #[test]
    fn decodes_captured_payload_prefix() {
        // First bytes of a captured step-count response.
        let decoded = XorCodec::default().decode(&[0x9A, 0x9C, 0xFF, 0xFF]);
        assert_eq!(decoded, vec![0x65, 0x63, 0x00, 0x00]);
    }

    #[test]
    fn in_place_matches_copying_decode() {
        let codec = XorCodec::new(0x5A);
        let mut bytes = vec![0x00, 0x5A, 0xA5];
        let expected = codec.decode(&bytes);
        codec.apply_in_place(&mut bytes);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn zero_key_is_identity() {
        assert_eq!(XorCodec::new(0).decode(&[1, 2, 3]), vec![1, 2, 3]);
    }
}
