use std::io;

use thiserror::Error;

/// Stores the possible errors that may be encountered when reading or writing
/// a manifest or certificate
#[derive(Error, Debug)]
pub enum ParseError {
    /// Caused by the file not being readable or writable
    #[error(transparent)]
    Io(#[from] io::Error),
    /// This happens when serialising or deserialising the manifest, caused by
    /// malformed JSON or missing fields
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The manifest was written by something else, or a different version
    #[error("Unsupported manifest schema {0:?}")]
    Schema(String),
    /// The manifest names a signature scheme this library does not use
    #[error("Unsupported signature scheme {algorithm}/{hash}/{prefix}")]
    Scheme {
        algorithm: String,
        hash: String,
        prefix: String,
    },
    /// No timestamp follows the start timestamp, so the negative check
    /// cannot be run against it
    #[error("Start timestamp {0} has no successor")]
    TimestampOutOfRange(u64),
    /// A line of a certificate could not be understood
    #[error("Invalid certificate line {line}: {reason}")]
    Certificate { line: usize, reason: String },
}
