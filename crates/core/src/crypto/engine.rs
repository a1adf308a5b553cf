use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};

use crate::spec::{Address, MESSAGE_PREFIX, PublicKey, Signature, SignatureError, encode_prefixed};

use super::{SigningIdentity, address_from_public_key, keccak256, key::public_key_of};

/// The hash which is actually signed:
/// `keccak256(prefix || len(message) || message)`.
///
/// Prefixing separates these signatures from transaction signatures made by
/// the same key.
pub fn hash_message(message: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(MESSAGE_PREFIX.len() + 20 + message.len());
    buf.extend_from_slice(MESSAGE_PREFIX.as_bytes());
    buf.extend_from_slice(message.len().to_string().as_bytes());
    buf.extend_from_slice(message.as_bytes());
    keccak256(&buf)
}

/// The result of signing a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signature: Signature,
    pub message_hash: [u8; 32],
}

impl SignedMessage {
    /// The message hash as `0x` prefixed hex, as stored in the manifest
    pub fn message_hash_hex(&self) -> String {
        encode_prefixed(self.message_hash)
    }
}

/// Signs the prefixed hash of `message`. Signatures are deterministic
/// (RFC 6979) and always low-S.
pub fn sign(identity: &SigningIdentity, message: &str) -> Result<SignedMessage, SignatureError> {
    let message_hash = hash_message(message);

    let (sig, recid) = identity
        .signing_key()
        .sign_prehash_recoverable(&message_hash)
        .map_err(|e| SignatureError::Recovery(e.to_string()))?;

    let mut rs = [0; 64];
    rs.copy_from_slice(&sig.to_bytes());

    Ok(SignedMessage {
        signature: Signature::from_parts(&rs, recid.to_byte()),
        message_hash,
    })
}

/// Recovers the public key which produced `signature` over the already
/// prefixed and hashed message
pub fn recover_public_key(
    message_hash: &[u8; 32],
    signature: &Signature,
) -> Result<PublicKey, SignatureError> {
    let recovery_err = |e: k256::ecdsa::Error| SignatureError::Recovery(e.to_string());

    let mut sig = EcdsaSignature::from_slice(signature.rs()).map_err(recovery_err)?;
    let mut recid = signature.recovery_id();

    // Accept high-S signatures from other signers by flipping to the
    // equivalent low-S form
    if let Some(normalised) = sig.normalize_s() {
        sig = normalised;
        recid ^= 1;
    }

    let recid = RecoveryId::from_byte(recid)
        .ok_or(SignatureError::RecoveryByte(signature.v()))?;

    let key = VerifyingKey::recover_from_prehash(message_hash, &sig, recid).map_err(recovery_err)?;

    public_key_of(&key).ok_or_else(|| SignatureError::Recovery("Invalid curve point".to_string()))
}

/// Recovers the address which signed `message`
pub fn recover_address(message: &str, signature: &Signature) -> Result<Address, SignatureError> {
    let key = recover_public_key(&hash_message(message), signature)?;
    Ok(address_from_public_key(&key))
}

/// Both halves of a signature check. There is no partial success, see
/// [VerifyOutcome::is_valid].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub address_matches: bool,
    pub public_key_matches: bool,
}

impl VerifyOutcome {
    pub const REJECTED: VerifyOutcome = VerifyOutcome {
        address_matches: false,
        public_key_matches: false,
    };

    pub fn is_valid(&self) -> bool {
        self.address_matches && self.public_key_matches
    }
}

/// Recovers the signer of `message` and compares it to what is expected.
///
/// When no public key is expected, the public key check trivially passes. A
/// signature which cannot be recovered at all fails both checks.
pub fn verify(
    expected_address: &Address,
    message: &str,
    signature: &Signature,
    expected_public_key: Option<&PublicKey>,
) -> VerifyOutcome {
    let Ok(key) = recover_public_key(&hash_message(message), signature) else {
        return VerifyOutcome::REJECTED;
    };

    VerifyOutcome {
        address_matches: address_from_public_key(&key) == *expected_address,
        public_key_matches: expected_public_key.is_none_or(|pk| *pk == key),
    }
}
