use std::{fmt::Display, io, path::PathBuf};

use thiserror::Error;
use tokio::task::JoinError;

use crate::{
    crypto::{KeyError, VerifyOutcome},
    file::{ParseError, Timestamp},
    spec::{PayloadShapeError, SignatureError},
    tools::CollaboratorError,
};

/// How the extracted frames on disk differ from those named in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSetMismatch {
    Count { expected: usize, found: usize },
    /// The manifest's own frame numbers are not 1, 2, 3, …
    Ordinal { index: usize, found: usize },
    Name {
        index: usize,
        expected: String,
        found: String,
    },
}

impl Display for FrameSetMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count { expected, found } => {
                write!(f, "expected {expected} frames but found {found}")
            }
            Self::Ordinal { index, found } => {
                write!(f, "record {index} is numbered {found}")
            }
            Self::Name {
                index,
                expected,
                found,
            } => write!(f, "frame {index} should be {expected:?} but is {found:?}"),
        }
    }
}

/// These are all the different ways a signing or verification run can fail.
///
/// Every one of them is fatal to the run which detects it, there is no
/// recovery or retry.
#[derive(Error, Debug)]
pub enum AttestError {
    #[error("Input does not exist: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("Frame extraction failed: {0}")]
    ExtractionFailed(#[source] CollaboratorError),
    #[error("Could not read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No frames found in {}", .0.display())]
    EmptyFrameSet(PathBuf),
    #[error("Frame set does not match the manifest: {0}")]
    FrameSetMismatch(FrameSetMismatch),
    #[error("Digest mismatch for {artifact}: expected {expected}, found {found}")]
    DigestMismatch {
        artifact: String,
        expected: String,
        found: String,
    },
    #[error("Rebuilt message differs from the stored message for {artifact}")]
    MessageMismatch { artifact: String },
    #[error(
        "Invalid signature for {artifact} (address matches: {}, public key matches: {})",
        .outcome.address_matches,
        .outcome.public_key_matches
    )]
    SignatureInvalid {
        artifact: String,
        outcome: VerifyOutcome,
    },
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Could not canonicalize {}: {reason}", .path.display())]
    CanonicalizationFailed { path: PathBuf, reason: String },
    #[error("Timestamp {0} has no successor and cannot be signed")]
    UnsignableTimestamp(Timestamp),
    #[error("Frame {frame} still verifies with a different timestamp")]
    TimestampNotCommitted { frame: usize },
    #[error("Malformed manifest: {0}")]
    MalformedManifest(#[from] ParseError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Task(#[from] JoinError),
}

impl From<PayloadShapeError> for AttestError {
    fn from(value: PayloadShapeError) -> Self {
        AttestError::MalformedPayload(value.to_string())
    }
}

impl From<FrameSetMismatch> for AttestError {
    fn from(value: FrameSetMismatch) -> Self {
        AttestError::FrameSetMismatch(value)
    }
}
