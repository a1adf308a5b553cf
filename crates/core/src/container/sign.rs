use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info};

use crate::{
    AttestError, Config,
    canonical::{canonical_tags, canonicalize_container},
    crypto::{SigningIdentity, build_file_message, sha256_file, sign},
    file::Timestamp,
    spec::{PAYLOAD_TAG, WholeFilePayload},
    tools::TagRewriter,
};

use super::temp_sibling;

/// A delivered container and the payload embedded into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedFile {
    pub output: PathBuf,
    pub payload: WholeFilePayload,
}

/// Signs whole containers, embedding the payload as a metadata tag
#[derive(Clone)]
pub struct FileSigner {
    identity: Arc<SigningIdentity>,
    tagger: Arc<dyn TagRewriter>,
}

impl FileSigner {
    pub fn new(identity: Arc<SigningIdentity>, tagger: Arc<dyn TagRewriter>) -> Self {
        Self { identity, tagger }
    }

    /// Signs `input` with `timestamp` and writes the delivered container to
    /// `output`.
    ///
    /// `output` only ever appears once it is complete, the intermediate
    /// canonical container is removed whether or not signing succeeds.
    pub async fn sign_file(
        &self,
        input: &Path,
        output: &Path,
        timestamp: Timestamp,
    ) -> Result<SignedFile, AttestError> {
        if !input.exists() {
            return Err(AttestError::InputMissing(input.to_path_buf()));
        }

        if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        info!(
            input = %input.display(),
            %timestamp,
            signer = %self.identity.address(),
            "Signing file"
        );

        let canonical = temp_sibling(output)?;
        canonicalize_container(self.tagger.as_ref(), input, &canonical, timestamp).await?;

        let file_hash = sha256_file(&canonical).await?;
        debug!(digest = %file_hash, "Hashed canonical container");

        let message = build_file_message(timestamp, &file_hash);
        let signed = sign(&self.identity, &message)?;

        let payload = WholeFilePayload::new(
            timestamp,
            file_hash,
            self.identity.address(),
            &signed.signature,
        );
        let payload_json = payload
            .to_json()
            .map_err(|e| AttestError::MalformedPayload(e.to_string()))?;

        let mut tags = canonical_tags(timestamp);
        tags.insert(PAYLOAD_TAG.to_string(), payload_json);

        let delivered = temp_sibling(output)?;
        self.tagger.rewrite(&canonical, &delivered, &tags).await?;
        delivered.persist(output).map_err(|e| e.error)?;

        info!(output = %output.display(), "Signed file written");

        Ok(SignedFile {
            output: output.to_path_buf(),
            payload,
        })
    }

    /// Signs `input` into the configured `signed/` directory
    pub async fn sign_into(
        &self,
        config: &Config,
        input: &Path,
        timestamp: Timestamp,
    ) -> Result<SignedFile, AttestError> {
        self.sign_file(input, &config.signed_path(input), timestamp)
            .await
    }
}
