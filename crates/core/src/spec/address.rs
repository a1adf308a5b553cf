use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::encoding::{decode_prefixed, encode_prefixed};

pub const ADDRESS_LENGTH: usize = 20;
pub const PUBLIC_KEY_LENGTH: usize = 65;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Expected `0x` followed by {expected} hex characters, got {found:?}")]
    Address { expected: usize, found: String },
    #[error("Expected a 65 byte uncompressed public key, got {0:?}")]
    PublicKey(String),
}

/// The 20 byte account address derived from a public key, written as `0x`
/// followed by 40 lowercase hex characters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_prefixed(self.0))
    }
}

impl FromStr for Address {
    type Err = ShapeError;

    /// Only accepts the exact shape, so `not-an-address` is rejected without
    /// any further work. Checksummed (mixed case) addresses are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ShapeError::Address {
            expected: ADDRESS_LENGTH * 2,
            found: s.to_string(),
        };

        let digits = s.strip_prefix("0x").ok_or_else(err)?;
        if digits.len() != ADDRESS_LENGTH * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }

        let mut bytes = [0; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| err())?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = ShapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

/// An uncompressed SEC1 encoded public key (`0x04 || x || y`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().ok()?;
        (bytes[0] == 0x04).then_some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_prefixed(self.0))
    }
}

impl FromStr for PublicKey {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_prefixed(s)
            .ok()
            .and_then(|b| Self::from_slice(&b))
            .ok_or_else(|| ShapeError::PublicKey(s.to_string()))
    }
}

impl TryFrom<String> for PublicKey {
    type Error = ShapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        value.to_string()
    }
}
