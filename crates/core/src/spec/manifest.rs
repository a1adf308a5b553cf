use serde::{Deserialize, Serialize};

use crate::file::Timestamp;

use super::{MANIFEST_SCHEMA, Signature, SignerIdentity};

/// Everything recorded about a single signed frame
///
/// Within the manifest, the records are stored in the order the frames were
/// signed which is the sorted order of their filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    /// 1-based position of the frame
    pub frame_number: usize,
    /// The name the extractor gave the frame
    pub filename: String,
    /// Hex SHA-256 of the raw frame bytes
    pub frame_hash_sha256: String,
    /// The exact string which was signed
    pub message: String,
    /// `0x` prefixed keccak256 of the prefixed message
    pub message_hash: String,
    pub signature: Signature,
}

/// The durable output of signing the frames of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema: String,
    /// Identifies the media the frames were extracted from
    pub input: String,
    /// Shared by every frame message of the run
    pub start_timestamp_ms: Timestamp,
    pub signer: SignerIdentity,
    pub frames: Vec<FrameRecord>,
}

impl Manifest {
    pub fn new(
        input: String,
        start_timestamp_ms: Timestamp,
        signer: SignerIdentity,
        frames: Vec<FrameRecord>,
    ) -> Self {
        Self {
            schema: MANIFEST_SCHEMA.to_string(),
            input,
            start_timestamp_ms,
            signer,
            frames,
        }
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.filename.as_str())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
