//! Reduces an artifact to the exact bytes which are hashed.
//!
//! A frame is hashed exactly as the extractor wrote it. A whole container
//! cannot be, since the payload embedded into it contains the hash itself, so
//! it is first rewritten to carry nothing but the timestamp tag. The payload
//! is only added afterwards, and verification strips it again with the same
//! rewrite to get back to identical bytes.

use std::path::Path;

use tracing::debug;

use crate::{
    AttestError,
    file::Timestamp,
    spec::{PAYLOAD_TAG, TIMESTAMP_TAG},
    tools::{TagRewriter, Tags},
};

/// The only tags a canonical container carries
pub fn canonical_tags(timestamp: Timestamp) -> Tags {
    Tags::from([(TIMESTAMP_TAG.to_string(), timestamp.to_string())])
}

/// Rewrites `input` into `output` with every tag cleared and only the
/// timestamp tag set, keeping the streams untouched
pub async fn canonicalize_container<T: TagRewriter + ?Sized>(
    tagger: &T,
    input: &Path,
    output: &Path,
    timestamp: Timestamp,
) -> Result<(), AttestError> {
    let tags = canonical_tags(timestamp);
    let failed = |reason: String| AttestError::CanonicalizationFailed {
        path: input.to_path_buf(),
        reason,
    };

    debug!(input = %input.display(), %timestamp, "Canonicalizing container");

    tagger
        .rewrite(input, output, &tags)
        .await
        .map_err(|e| failed(e.to_string()))?;

    // Make sure the rewriter really did what was asked, otherwise the digest
    // would be over something other than the canonical form
    let written = tagger
        .read_tags(output)
        .await
        .map_err(|e| failed(e.to_string()))?;

    if written.contains_key(PAYLOAD_TAG) {
        return Err(failed(format!("{PAYLOAD_TAG:?} tag was not cleared")));
    }

    match written.get(TIMESTAMP_TAG) {
        Some(ts) if *ts == timestamp.to_string() => Ok(()),
        Some(ts) => Err(failed(format!("timestamp tag is {ts:?}, expected {timestamp}"))),
        None => Err(failed("timestamp tag was not written".to_string())),
    }
}
