use std::path::{Path, PathBuf};

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};

use crate::{
    AttestError,
    crypto::{VerifyOutcome, build_file_message, build_message, hash_message, sha256_hex, verify},
    error::FrameSetMismatch,
    file::{FrameCertificate, ParseError, Timestamp},
    spec::{Address, FrameRecord, Manifest, SignerIdentity, encode_prefixed},
};

use super::{frame_artifact, list_frames};

/// The result of checking a single frame against its record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameVerdict {
    Verified,
    DigestMismatch { expected: String, found: String },
    /// Either the rebuilt message or its hash differs from the record
    MessageMismatch,
    SignatureInvalid(VerifyOutcome),
}

impl FrameVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, FrameVerdict::Verified)
    }

    /// Converts a failed verdict into the error which rejects the run
    pub fn into_error(self, artifact: String) -> Option<AttestError> {
        match self {
            FrameVerdict::Verified => None,
            FrameVerdict::DigestMismatch { expected, found } => Some(AttestError::DigestMismatch {
                artifact,
                expected,
                found,
            }),
            FrameVerdict::MessageMismatch => Some(AttestError::MessageMismatch { artifact }),
            FrameVerdict::SignatureInvalid(outcome) => {
                Some(AttestError::SignatureInvalid { artifact, outcome })
            }
        }
    }
}

/// What was established by an accepted frame verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub frames: usize,
    pub start_timestamp: Timestamp,
    pub signer: Address,
    /// The certificate which was also checked, only `None` when a missing
    /// certificate was allowed
    pub certificate: Option<PathBuf>,
}

/// Checks extracted frames against a manifest.
///
/// Verification runs as a fixed sequence, any step failing rejects:
///
/// 1. The manifest is loaded
/// 2. The frames on disk must be exactly the frames in the manifest
/// 3. Every frame is rehashed and its message and signature rechecked
/// 4. The signatures must *not* verify with the timestamp moved on by one
/// 5. The certificate next to the manifest must cover it
#[derive(Debug, Clone)]
pub struct FrameVerifier {
    workers: usize,
    require_certificate: bool,
}

impl Default for FrameVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// The verdict for one frame given its bytes, with the message rebuilt using
/// `timestamp`
fn check_frame(
    signer: &SignerIdentity,
    record: &FrameRecord,
    timestamp: Timestamp,
    bytes: &[u8],
) -> FrameVerdict {
    let found = sha256_hex(bytes);
    if found != record.frame_hash_sha256 {
        return FrameVerdict::DigestMismatch {
            expected: record.frame_hash_sha256.clone(),
            found,
        };
    }

    let message = build_message(timestamp, record.frame_number, &found);
    if message != record.message || encode_prefixed(hash_message(&message)) != record.message_hash
    {
        return FrameVerdict::MessageMismatch;
    }

    let outcome = verify(
        &signer.address,
        &message,
        &record.signature,
        Some(&signer.public_key),
    );
    if !outcome.is_valid() {
        return FrameVerdict::SignatureInvalid(outcome);
    }

    FrameVerdict::Verified
}

impl FrameVerifier {
    pub fn new() -> Self {
        Self {
            workers: crate::config::default_workers(),
            require_certificate: true,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Accepts a manifest without a certificate next to it.
    ///
    /// Only the frames are then checked, which leaves fields such as the
    /// input identifier unauthenticated.
    pub fn allow_missing_certificate(mut self) -> Self {
        self.require_certificate = false;
        self
    }

    /// Loads the manifest at `manifest_path`, verifies the frames in
    /// `frames_dir` against it and then checks the certificate stored next to
    /// the manifest
    pub async fn verify_file<P: AsRef<Path>>(
        &self,
        manifest_path: P,
        frames_dir: &Path,
    ) -> Result<FrameReport, AttestError> {
        let manifest_path = manifest_path.as_ref();
        info!(manifest = %manifest_path.display(), "Loading manifest");

        let (manifest, manifest_bytes) = Manifest::from_file(manifest_path)?;
        let mut report = self.verify(&manifest, frames_dir).await?;

        let certificate_path = FrameCertificate::path_for(manifest_path);
        if certificate_path.exists() {
            let certificate = FrameCertificate::from_file(&certificate_path)?;
            Self::verify_certificate(&certificate, &manifest, &manifest_bytes)?;

            debug!(certificate = %certificate_path.display(), "Certificate verified");
            report.certificate = Some(certificate_path);
        } else if self.require_certificate {
            warn!(certificate = %certificate_path.display(), "No certificate next to the manifest");
            return Err(AttestError::InputMissing(certificate_path));
        } else {
            warn!(
                certificate = %certificate_path.display(),
                "No certificate next to the manifest, only the frames were checked"
            );
        }

        Ok(report)
    }

    /// Verifies the frames within `frames_dir` against an already loaded
    /// manifest
    pub async fn verify(
        &self,
        manifest: &Manifest,
        frames_dir: &Path,
    ) -> Result<FrameReport, AttestError> {
        if manifest.is_empty() {
            return Err(AttestError::EmptyFrameSet(frames_dir.to_path_buf()));
        }

        let listing = list_frames(frames_dir).await?;
        Self::check_frame_set(manifest, &listing).inspect_err(|e| {
            warn!(frames_dir = %frames_dir.display(), "Frame set mismatch: {e}");
        })?;

        let verdicts = self
            .check_frames(manifest, frames_dir, manifest.start_timestamp_ms)
            .await?;

        for (record, verdict) in manifest.frames.iter().zip(verdicts) {
            let artifact = frame_artifact(record.frame_number, &record.filename);
            if let Some(err) = verdict.into_error(artifact) {
                warn!("Rejected: {err}");
                return Err(err);
            }
        }

        self.negative_check(manifest).await?;

        info!(
            frames = manifest.len(),
            timestamp = %manifest.start_timestamp_ms,
            signer = %manifest.signer.address,
            "Frames verified"
        );

        Ok(FrameReport {
            frames: manifest.len(),
            start_timestamp: manifest.start_timestamp_ms,
            signer: manifest.signer.address,
            certificate: None,
        })
    }

    /// Compares the sorted frame listing with the manifest, element by
    /// element. The manifest's own numbering must also be contiguous from 1.
    pub fn check_frame_set(manifest: &Manifest, listing: &[String]) -> Result<(), FrameSetMismatch> {
        if manifest.len() != listing.len() {
            return Err(FrameSetMismatch::Count {
                expected: manifest.len(),
                found: listing.len(),
            });
        }

        for (i, (record, found)) in manifest.frames.iter().zip(listing).enumerate() {
            let index = i + 1;
            if record.frame_number != index {
                return Err(FrameSetMismatch::Ordinal {
                    index,
                    found: record.frame_number,
                });
            }

            if record.filename != *found {
                return Err(FrameSetMismatch::Name {
                    index,
                    expected: record.filename.clone(),
                    found: found.clone(),
                });
            }
        }

        Ok(())
    }

    /// Rehashes every frame and rechecks it with messages rebuilt from
    /// `timestamp`, returning one verdict per record in manifest order.
    ///
    /// Only failing to read a frame is an error here, every other problem is
    /// reported through the verdicts.
    pub async fn check_frames(
        &self,
        manifest: &Manifest,
        frames_dir: &Path,
        timestamp: Timestamp,
    ) -> Result<Vec<FrameVerdict>, AttestError> {
        stream::iter(manifest.frames.iter().cloned())
            .map(|record| {
                let signer = manifest.signer.clone();
                let path = frames_dir.join(&record.filename);

                async move {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .map_err(|source| AttestError::Unreadable { path, source })?;

                    let verdict = tokio::task::spawn_blocking(move || {
                        check_frame(&signer, &record, timestamp, &bytes)
                    })
                    .await?;

                    Ok::<_, AttestError>(verdict)
                }
            })
            .buffered(self.workers)
            .try_collect()
            .await
    }

    /// Proves the timestamp is committed to: with the timestamp moved on by
    /// one millisecond, not a single stored signature may still verify.
    ///
    /// This runs over the stored digests, which step 3 has already shown to
    /// match the frames on disk.
    pub async fn negative_check(&self, manifest: &Manifest) -> Result<(), AttestError> {
        let start = manifest.start_timestamp_ms;
        let shifted = start
            .next()
            .ok_or(ParseError::TimestampOutOfRange(start.as_millis()))?;
        debug!(timestamp = %shifted, "Running negative check");

        let outcomes: Vec<(usize, VerifyOutcome)> = stream::iter(manifest.frames.iter().cloned())
            .map(|record| {
                let signer = manifest.signer.clone();
                tokio::task::spawn_blocking(move || {
                    let message =
                        build_message(shifted, record.frame_number, &record.frame_hash_sha256);
                    let outcome = verify(
                        &signer.address,
                        &message,
                        &record.signature,
                        Some(&signer.public_key),
                    );
                    (record.frame_number, outcome)
                })
            })
            .buffered(self.workers)
            .try_collect()
            .await?;

        match outcomes.iter().find(|(_, outcome)| outcome.is_valid()) {
            Some((frame, _)) => {
                warn!(frame, "Signature verifies with a shifted timestamp");
                Err(AttestError::TimestampNotCommitted { frame: *frame })
            }
            None => Ok(()),
        }
    }

    /// Checks a certificate against the manifest bytes it should cover and the
    /// signer the manifest names
    pub fn verify_certificate(
        certificate: &FrameCertificate,
        manifest: &Manifest,
        manifest_bytes: &[u8],
    ) -> Result<(), AttestError> {
        let artifact = format!("certificate for {}", manifest.input);

        let found = sha256_hex(manifest_bytes);
        if found != certificate.manifest_sha256 {
            return Err(AttestError::DigestMismatch {
                artifact,
                expected: certificate.manifest_sha256.clone(),
                found,
            });
        }

        if certificate.start_timestamp != manifest.start_timestamp_ms
            || certificate.input != manifest.input
        {
            return Err(AttestError::MessageMismatch { artifact });
        }

        let message = build_file_message(certificate.start_timestamp, &found);
        let mut outcome = verify(
            &manifest.signer.address,
            &message,
            &certificate.signature,
            Some(&manifest.signer.public_key),
        );
        outcome.address_matches &= certificate.signer == manifest.signer.address;

        if !outcome.is_valid() {
            return Err(AttestError::SignatureInvalid { artifact, outcome });
        }

        Ok(())
    }
}
