use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::encoding::{decode_prefixed, encode_prefixed};

/// Length of a recoverable signature: `r || s || v`
pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature is not valid hex: {0}")]
    Hex(String),
    #[error("Signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    Length(usize),
    #[error("Recovery byte {0} is not one of 0, 1, 27 or 28")]
    RecoveryByte(u8),
    #[error("The r, s and v fields do not agree with the signature bytes")]
    Inconsistent,
    #[error("Could not recover a public key from the signature: {0}")]
    Recovery(String),
}

/// A recoverable secp256k1 signature, stored with `v` normalised to 27/28 as
/// is conventional for prefixed message signatures
///
/// Within a manifest this is stored as the object
/// `{"bytes": "0x…", "r": "0x…", "s": "0x…", "v": 27}`, whereas within an
/// embedded payload it is the `bytes` string alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSignature", into = "RawSignature")]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Builds the signature from the compact 64 byte `r || s` form and the
    /// recovery id (0 or 1)
    pub fn from_parts(rs: &[u8; 64], recovery_id: u8) -> Self {
        let mut bytes = [0; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(rs);
        bytes[64] = 27 + (recovery_id & 1);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SignatureError::Length(bytes.len()))?;

        let v = match bytes[64] {
            0 | 1 => bytes[64] + 27,
            27 | 28 => bytes[64],
            b => return Err(SignatureError::RecoveryByte(b)),
        };

        let mut normalised = bytes;
        normalised[64] = v;
        Ok(Self(normalised))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    /// The `r || s` pair without the recovery byte
    pub fn rs(&self) -> &[u8] {
        &self.0[..64]
    }

    /// Either 27 or 28
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Either 0 or 1
    pub fn recovery_id(&self) -> u8 {
        self.0[64] - 27
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_prefixed(self.0))
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed(s).map_err(|e| SignatureError::Hex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// The on-disk form, with the components repeated to make the manifest easy
/// to audit by hand
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSignature {
    bytes: String,
    r: String,
    s: String,
    v: u8,
}

impl From<Signature> for RawSignature {
    fn from(value: Signature) -> Self {
        RawSignature {
            bytes: value.to_string(),
            r: encode_prefixed(value.r()),
            s: encode_prefixed(value.s()),
            v: value.v(),
        }
    }
}

impl TryFrom<RawSignature> for Signature {
    type Error = SignatureError;

    fn try_from(value: RawSignature) -> Result<Self, Self::Error> {
        let sig: Signature = value.bytes.parse()?;

        let r = decode_prefixed(&value.r).map_err(|e| SignatureError::Hex(e.to_string()))?;
        let s = decode_prefixed(&value.s).map_err(|e| SignatureError::Hex(e.to_string()))?;
        let v = match value.v {
            0 | 1 => value.v + 27,
            v => v,
        };

        if r != sig.r() || s != sig.s() || v != sig.v() {
            return Err(SignatureError::Inconsistent);
        }

        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Signature {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&[0x11; 32]);
        rs[32..].copy_from_slice(&[0x22; 32]);
        Signature::from_parts(&rs, 1)
    }

    #[test]
    fn normalises_recovery_byte() {
        let mut bytes = *example().as_bytes();
        bytes[64] = 0;
        let sig = Signature::from_slice(&bytes).unwrap();
        assert_eq!(sig.v(), 27);
        assert_eq!(sig.recovery_id(), 0);

        bytes[64] = 5;
        assert_eq!(
            Signature::from_slice(&bytes),
            Err(SignatureError::RecoveryByte(5))
        );
    }

    #[test]
    fn manifest_form() {
        let json = serde_json::to_value(example()).unwrap();
        assert_eq!(json["v"], 28);
        assert_eq!(json["r"], format!("0x{}", "11".repeat(32)));
        assert_eq!(json["s"], format!("0x{}", "22".repeat(32)));

        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, example());
    }

    #[test]
    fn rejects_disagreeing_components() {
        let mut json = serde_json::to_value(example()).unwrap();
        json["r"] = format!("0x{}", "33".repeat(32)).into();

        let res = serde_json::from_value::<Signature>(json);
        assert!(res.is_err(), "Tampered r component is detected");
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!("0x1234".parse::<Signature>(), Err(SignatureError::Length(2)));
    }
}
