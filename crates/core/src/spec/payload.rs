use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file::{MIN_TIMESTAMP_DIGITS, Timestamp};

use super::{Address, ShapeError, Signature, SignatureError, encoding::is_lower_hex};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadShapeError {
    #[error("Timestamp {0:?} must be decimal with at least {MIN_TIMESTAMP_DIGITS} digits")]
    Timestamp(String),
    #[error("File hash {0:?} is not 64 lowercase hex characters")]
    FileHash(String),
    #[error("Signer address is malformed: {0}")]
    Address(#[from] ShapeError),
    #[error("Signature is malformed: {0}")]
    Signature(#[from] SignatureError),
}

/// The verification record embedded in a whole-file container's metadata.
///
/// Every field is kept as a string here so that a payload written by a
/// different tool can still be read, and have its shape checked, before any
/// signature maths is attempted (see [WholeFilePayload::validate]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WholeFilePayload {
    pub timestamp_ms: String,
    pub file_hash_sha256: String,
    pub signer_address: String,
    pub signature: String,
}

/// A [WholeFilePayload] which has been shape checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayload {
    pub timestamp: Timestamp,
    pub file_hash: String,
    pub signer: Address,
    pub signature: Signature,
}

impl WholeFilePayload {
    pub fn new(
        timestamp: Timestamp,
        file_hash: String,
        signer: &Address,
        signature: &Signature,
    ) -> Self {
        Self {
            timestamp_ms: timestamp.to_string(),
            file_hash_sha256: file_hash,
            signer_address: signer.to_string(),
            signature: signature.to_string(),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Checks the shape of each field, independently of any cryptography
    pub fn validate(&self) -> Result<ValidatedPayload, PayloadShapeError> {
        let timestamp = Timestamp::parse_strict(&self.timestamp_ms)
            .ok_or_else(|| PayloadShapeError::Timestamp(self.timestamp_ms.clone()))?;

        let signer: Address = self.signer_address.parse()?;

        if !is_lower_hex(&self.file_hash_sha256, 64) {
            return Err(PayloadShapeError::FileHash(self.file_hash_sha256.clone()));
        }

        let signature: Signature = self.signature.parse()?;

        Ok(ValidatedPayload {
            timestamp,
            file_hash: self.file_hash_sha256.clone(),
            signer,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> WholeFilePayload {
        WholeFilePayload {
            timestamp_ms: "1700000000000".to_string(),
            file_hash_sha256: "ab".repeat(32),
            signer_address: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            signature: format!("0x{}1b", "11".repeat(64)),
        }
    }

    #[test]
    fn valid_shape() {
        let v = payload().validate().expect("Payload is well formed");
        assert_eq!(v.timestamp, Timestamp::from_millis(1_700_000_000_000));
        assert_eq!(v.signature.v(), 27);
    }

    #[test]
    fn bad_address() {
        let mut p = payload();
        p.signer_address = "not-an-address".to_string();
        assert!(matches!(p.validate(), Err(PayloadShapeError::Address(_))));
    }

    #[test]
    fn short_timestamp() {
        let mut p = payload();
        p.timestamp_ms = "1000".to_string();
        assert!(matches!(p.validate(), Err(PayloadShapeError::Timestamp(_))));
    }

    #[test]
    fn uppercase_hash() {
        let mut p = payload();
        p.file_hash_sha256 = "AB".repeat(32);
        assert!(matches!(p.validate(), Err(PayloadShapeError::FileHash(_))));
    }

    #[test]
    fn json_keys() {
        let json = payload().to_json().unwrap();
        assert!(json.starts_with(r#"{"timestampMs":"1700000000000","fileHashSha256":"#));
        assert_eq!(WholeFilePayload::from_json(&json).unwrap(), payload());
    }
}
