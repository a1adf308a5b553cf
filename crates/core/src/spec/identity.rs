use serde::{Deserialize, Serialize};

use super::{
    Address, MESSAGE_HASH, MESSAGE_PREFIX_SCHEME, PublicKey, SIGNATURE_ALGORITHM,
};

/// The public half of the key which signed a run. This is recorded in every
/// manifest so the verifier can check both the recovered address and the
/// recovered public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerIdentity {
    pub address: Address,
    pub public_key: PublicKey,
    pub algorithm: String,
    pub hash: String,
    pub message_prefix: String,
}

impl SignerIdentity {
    pub fn new(address: Address, public_key: PublicKey) -> Self {
        Self {
            address,
            public_key,
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            hash: MESSAGE_HASH.to_string(),
            message_prefix: MESSAGE_PREFIX_SCHEME.to_string(),
        }
    }

    /// Whether the tags describe the one scheme this library signs with
    pub fn is_supported_scheme(&self) -> bool {
        self.algorithm == SIGNATURE_ALGORITHM
            && self.hash == MESSAGE_HASH
            && self.message_prefix == MESSAGE_PREFIX_SCHEME
    }
}
