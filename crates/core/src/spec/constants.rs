/// The schema tag written into every frame manifest
pub const MANIFEST_SCHEMA: &str = "media-signer/frames/v1";

pub const SIGNATURE_ALGORITHM: &str = "secp256k1";
pub const MESSAGE_HASH: &str = "keccak256";
pub const MESSAGE_PREFIX_SCHEME: &str = "eip191-personal-sign";

/// Prefix prepended (together with the message length) before hashing a
/// message for signing
pub const MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Container tag which holds the signing timestamp, both in the canonical
/// form and the delivered file
pub const TIMESTAMP_TAG: &str = "signing_timestamp_ms";

/// Container tag which holds the embedded [crate::spec::WholeFilePayload]
pub const PAYLOAD_TAG: &str = "comment";
