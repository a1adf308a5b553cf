use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::{
    AttestError, Config,
    config::{media_identifier, media_stem},
    crypto::{SigningIdentity, build_file_message, build_message, sha256_hex, sign},
    file::{FrameCertificate, Timestamp, write_atomic},
    spec::{FrameRecord, Manifest, SignatureError},
    tools::FrameExtractor,
};

use super::{frame_artifact, list_frames};

/// The result of signing a set of frames, not yet written anywhere
#[derive(Debug, Clone)]
pub struct SignedFrames {
    pub manifest: Manifest,
    /// Exactly what will be written as the manifest file, and what the
    /// certificate's digest covers
    pub manifest_bytes: Vec<u8>,
    pub certificate: FrameCertificate,
}

impl SignedFrames {
    /// Writes the certificate and then the manifest, each atomically, so a
    /// manifest on disk always has its certificate next to it. Returns the
    /// certificate path.
    pub fn commit<P: AsRef<Path>>(&self, manifest_path: P) -> Result<PathBuf, AttestError> {
        let manifest_path = manifest_path.as_ref();
        if let Some(dir) = manifest_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let certificate_path = FrameCertificate::path_for(manifest_path);
        self.certificate.write(&certificate_path)?;
        write_atomic(manifest_path, &self.manifest_bytes)?;

        Ok(certificate_path)
    }
}

/// Where the outputs of [FrameSigner::sign_video] were written
#[derive(Debug, Clone)]
pub struct SignedVideo {
    pub frames_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub certificate_path: PathBuf,
    pub manifest: Manifest,
}

/// Signs every frame of a run with one identity and one timestamp
#[derive(Debug, Clone)]
pub struct FrameSigner {
    identity: Arc<SigningIdentity>,
    workers: usize,
}

/// Hashes, builds the message for and signs one frame
fn sign_frame(
    identity: &SigningIdentity,
    timestamp: Timestamp,
    frame_number: usize,
    filename: String,
    bytes: &[u8],
) -> Result<FrameRecord, SignatureError> {
    // The canonical form of a frame is its raw bytes
    let digest = sha256_hex(bytes);
    let message = build_message(timestamp, frame_number, &digest);
    let signed = sign(identity, &message)?;

    Ok(FrameRecord {
        frame_number,
        filename,
        frame_hash_sha256: digest,
        message_hash: signed.message_hash_hex(),
        message,
        signature: signed.signature,
    })
}

impl FrameSigner {
    pub fn new(identity: Arc<SigningIdentity>) -> Self {
        Self {
            identity,
            workers: crate::config::default_workers(),
        }
    }

    /// Limits how many frames are hashed and signed at once
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Signs the named frames within `frames_dir`, in the given order, with
    /// the same `timestamp` committed into every message.
    ///
    /// Any frame failing aborts the whole run, there is no partial result.
    /// The timestamp must have a successor for the run to be verifiable.
    pub async fn sign_frames(
        &self,
        input: &str,
        frames_dir: &Path,
        filenames: &[String],
        timestamp: Timestamp,
    ) -> Result<SignedFrames, AttestError> {
        if filenames.is_empty() {
            return Err(AttestError::EmptyFrameSet(frames_dir.to_path_buf()));
        }

        if timestamp.next().is_none() {
            return Err(AttestError::UnsignableTimestamp(timestamp));
        }

        info!(
            input,
            frames = filenames.len(),
            %timestamp,
            signer = %self.identity.address(),
            "Signing frames"
        );

        let records = stream::iter(filenames.iter().cloned().enumerate())
            .map(|(i, filename)| {
                let identity = self.identity.clone();
                let path = frames_dir.join(&filename);

                async move {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .map_err(|source| AttestError::Unreadable { path, source })?;

                    let frame_number = i + 1;
                    let record = tokio::task::spawn_blocking(move || {
                        sign_frame(&identity, timestamp, frame_number, filename, &bytes)
                    })
                    .await??;

                    debug!(
                        frame = %frame_artifact(frame_number, &record.filename),
                        digest = %record.frame_hash_sha256,
                        "Signed frame"
                    );

                    Ok::<_, AttestError>(record)
                }
            })
            // Ordered: results come out in input order whatever order they
            // finish in
            .buffered(self.workers)
            .try_collect::<Vec<_>>()
            .await?;

        let manifest = Manifest::new(
            input.to_string(),
            timestamp,
            self.identity.identity().clone(),
            records,
        );

        self.certify(manifest)
    }

    /// Serialises the manifest and signs `{timestamp, digest}` over the
    /// serialised bytes
    fn certify(&self, manifest: Manifest) -> Result<SignedFrames, AttestError> {
        let manifest_bytes = manifest.to_json_bytes()?;
        let manifest_sha256 = sha256_hex(&manifest_bytes);

        let message = build_file_message(manifest.start_timestamp_ms, &manifest_sha256);
        let signed = sign(&self.identity, &message)?;

        let certificate = FrameCertificate {
            input: manifest.input.clone(),
            start_timestamp: manifest.start_timestamp_ms,
            manifest_sha256,
            signer: *self.identity.address(),
            signature: signed.signature,
        };

        Ok(SignedFrames {
            manifest,
            manifest_bytes,
            certificate,
        })
    }

    /// Signs every frame already present in `frames_dir`
    pub async fn sign_dir(
        &self,
        input: &str,
        frames_dir: &Path,
        timestamp: Timestamp,
    ) -> Result<SignedFrames, AttestError> {
        let filenames = list_frames(frames_dir).await?;
        self.sign_frames(input, frames_dir, &filenames, timestamp).await
    }

    /// Runs the whole frame pipeline for a video: extracts its frames into a
    /// fresh directory, signs them and commits the manifest and certificate.
    pub async fn sign_video<E: FrameExtractor + ?Sized>(
        &self,
        config: &Config,
        extractor: &E,
        input: &Path,
        timestamp: Timestamp,
    ) -> Result<SignedVideo, AttestError> {
        if !input.exists() {
            return Err(AttestError::InputMissing(input.to_path_buf()));
        }

        let stem = media_stem(input);
        let frames_dir = config.frames_dir(&stem);

        // Stale frames from an earlier run would otherwise be signed too
        if frames_dir.exists() {
            tokio::fs::remove_dir_all(&frames_dir).await?;
        }
        tokio::fs::create_dir_all(&frames_dir).await?;

        info!(input = %input.display(), frames_dir = %frames_dir.display(), "Extracting frames");
        extractor
            .extract(input, &frames_dir)
            .await
            .map_err(AttestError::ExtractionFailed)?;

        let signed = self
            .sign_dir(&media_identifier(input), &frames_dir, timestamp)
            .await?;

        let manifest_path = config.manifest_path(&stem);
        let certificate_path = signed.commit(&manifest_path)?;

        info!(
            manifest = %manifest_path.display(),
            frames = signed.manifest.len(),
            "Committed manifest"
        );

        Ok(SignedVideo {
            frames_dir,
            manifest_path,
            certificate_path,
            manifest: signed.manifest,
        })
    }
}
