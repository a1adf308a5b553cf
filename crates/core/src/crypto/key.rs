use std::fmt::Debug;

use k256::{
    ecdsa::{SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use thiserror::Error;

use crate::spec::{Address, PublicKey, SignerIdentity, decode_prefixed};

use super::keccak256;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Private key is not valid hex")]
    Hex,
    #[error("Private key must be 32 bytes, got {0}")]
    Length(usize),
    #[error("Private key is not a valid secp256k1 scalar")]
    Scalar,
}

/// Derives the address from the last 20 bytes of the keccak256 of the
/// uncompressed public key (without its `0x04` tag)
pub fn address_from_public_key(key: &PublicKey) -> Address {
    let hash = keccak256(&key.as_bytes()[1..]);
    let mut bytes = [0; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::new(bytes)
}

pub(crate) fn public_key_of(key: &VerifyingKey) -> Option<PublicKey> {
    PublicKey::from_slice(key.to_encoded_point(false).as_bytes())
}

/// The single long lived key used for a signing session, together with the
/// public [SignerIdentity] derived from it once.
///
/// This is passed explicitly (normally behind an `Arc`) to everything that
/// signs, it is never mutated.
pub struct SigningIdentity {
    key: SigningKey,
    identity: SignerIdentity,
}

impl SigningIdentity {
    /// Parses a 32 byte private key written as hex, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = decode_prefixed(s.trim()).map_err(|_| KeyError::Hex)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::Length(bytes.len()));
        }

        let key = SigningKey::from_slice(bytes).map_err(|_| KeyError::Scalar)?;
        let public_key = public_key_of(key.verifying_key()).ok_or(KeyError::Scalar)?;
        let identity = SignerIdentity::new(address_from_public_key(&public_key), public_key);

        Ok(Self { key, identity })
    }

    pub fn identity(&self) -> &SignerIdentity {
        &self.identity
    }

    pub fn address(&self) -> &Address {
        &self.identity.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.identity.public_key
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

impl Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.identity.address)
            .finish_non_exhaustive()
    }
}
