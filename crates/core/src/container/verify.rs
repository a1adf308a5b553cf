use std::{path::Path, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    AttestError,
    canonical::canonicalize_container,
    crypto::{VerifyOutcome, build_file_message, recover_address, sha256_file},
    file::Timestamp,
    spec::{Address, PAYLOAD_TAG, TIMESTAMP_TAG, ValidatedPayload, WholeFilePayload},
    tools::TagRewriter,
};

use super::temp_scratch;

/// What was established by an accepted whole-file verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub timestamp: Timestamp,
    pub file_hash: String,
    pub signer_address: Address,
}

/// Verifies containers signed by [crate::container::FileSigner]
#[derive(Clone)]
pub struct FileVerifier {
    tagger: Arc<dyn TagRewriter>,
}

impl FileVerifier {
    pub fn new(tagger: Arc<dyn TagRewriter>) -> Self {
        Self { tagger }
    }

    /// Reads the embedded payload and checks its shape, without any
    /// cryptography
    pub async fn read_payload(&self, input: &Path) -> Result<ValidatedPayload, AttestError> {
        let tags = self
            .tagger
            .read_tags(input)
            .await
            .map_err(|e| AttestError::MalformedPayload(format!("could not read tags: {e}")))?;

        let raw = tags
            .get(PAYLOAD_TAG)
            .ok_or_else(|| AttestError::MalformedPayload(format!("no {PAYLOAD_TAG:?} tag")))?;

        let payload = WholeFilePayload::from_json(raw)
            .map_err(|e| AttestError::MalformedPayload(e.to_string()))?
            .validate()?;

        // The container's own timestamp tag must say the same as the payload
        if tags
            .get(TIMESTAMP_TAG)
            .is_some_and(|ts| *ts != payload.timestamp.to_string())
        {
            return Err(AttestError::MessageMismatch {
                artifact: format!("{} {TIMESTAMP_TAG} tag", input.display()),
            });
        }

        Ok(payload)
    }

    /// Verifies a signed container.
    ///
    /// When `expected` is given, the embedded timestamp must also be exactly
    /// that timestamp.
    pub async fn verify_file(
        &self,
        input: &Path,
        expected: Option<Timestamp>,
    ) -> Result<FileReport, AttestError> {
        if !input.exists() {
            return Err(AttestError::InputMissing(input.to_path_buf()));
        }

        let artifact = input.display().to_string();
        info!(input = %artifact, "Verifying file");

        let payload = self.read_payload(input).await.inspect_err(|e| {
            warn!(input = %artifact, "Rejected: {e}");
        })?;

        if expected.is_some_and(|ts| ts != payload.timestamp) {
            warn!(
                input = %artifact,
                embedded = %payload.timestamp,
                "Embedded timestamp is not the expected one"
            );
            return Err(AttestError::MessageMismatch { artifact });
        }

        let canonical = temp_scratch(input)?;
        canonicalize_container(self.tagger.as_ref(), input, &canonical, payload.timestamp).await?;
        let found = sha256_file(&canonical).await?;
        drop(canonical);

        if found != payload.file_hash {
            warn!(input = %artifact, "Digest mismatch");
            return Err(AttestError::DigestMismatch {
                artifact,
                expected: payload.file_hash,
                found,
            });
        }

        let message = build_file_message(payload.timestamp, &found);
        let recovered = recover_address(&message, &payload.signature).ok();
        debug!(?recovered, expected = %payload.signer, "Recovered signer");

        if recovered != Some(payload.signer) {
            warn!(input = %artifact, "Signature does not match signer");
            return Err(AttestError::SignatureInvalid {
                artifact,
                outcome: VerifyOutcome {
                    address_matches: false,
                    // No public key is embedded, so there is none to compare
                    public_key_matches: true,
                },
            });
        }

        info!(
            input = %artifact,
            timestamp = %payload.timestamp,
            signer = %payload.signer,
            "File verified"
        );

        Ok(FileReport {
            timestamp: payload.timestamp,
            file_hash: found,
            signer_address: payload.signer,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{tests::MemTagger, tools::Tags};

    use super::*;

    fn container(tags: &[(&str, &str)]) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = testlibs::random_temp_dir();
        let path = dir.join("clip.mp4");
        let tags: Tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MemTagger::create(&path, &tags, b"stream").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn missing_payload() {
        let (dir, path) = container(&[(TIMESTAMP_TAG, "1700000000000")]);

        let res = FileVerifier::new(Arc::new(MemTagger::new()))
            .verify_file(&path, None)
            .await;
        assert!(matches!(res, Err(AttestError::MalformedPayload(_))));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn payload_not_json() {
        let (dir, path) = container(&[(PAYLOAD_TAG, "made with a phone")]);

        let res = FileVerifier::new(Arc::new(MemTagger::new()))
            .verify_file(&path, None)
            .await;
        assert!(matches!(res, Err(AttestError::MalformedPayload(_))));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn timestamp_tag_disagrees() {
        let payload = WholeFilePayload {
            timestamp_ms: "1700000000000".to_string(),
            file_hash_sha256: "ab".repeat(32),
            signer_address: testlibs::keys::ALICE_ADDRESS.to_string(),
            signature: format!("0x{}1b", "11".repeat(64)),
        };
        let json = payload.to_json().unwrap();
        let (dir, path) = container(&[(TIMESTAMP_TAG, "1700000000001"), (PAYLOAD_TAG, &json)]);

        let res = FileVerifier::new(Arc::new(MemTagger::new()))
            .verify_file(&path, None)
            .await;
        assert!(matches!(res, Err(AttestError::MessageMismatch { .. })));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
