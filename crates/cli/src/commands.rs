use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use media_signer::{
    Config, FileSigner, FileVerifier, FrameSigner, FrameVerifier, SigningIdentity, Timestamp,
    tools::FrameExtractor,
};
use tracing::info;

use crate::Extractor;

fn load_identity(private_key: &str) -> Result<Arc<SigningIdentity>> {
    let identity = SigningIdentity::from_hex(private_key.trim())
        .context("MEDIA_SIGNER_PRIVATE_KEY is not a valid secp256k1 private key")?;
    info!(signer = %identity.address(), "Loaded signing key");
    Ok(Arc::new(identity))
}

fn extractor(config: &Config, kind: Extractor) -> Result<Box<dyn FrameExtractor>> {
    match kind {
        Extractor::Ffmpeg => Ok(Box::new(config.extractor())),
        #[cfg(feature = "gstreamer")]
        Extractor::Gstreamer => Ok(Box::new(media_signer::tools::GstExtractor {
            frame_timeout: config.tool_timeout,
        })),
        #[cfg(not(feature = "gstreamer"))]
        Extractor::Gstreamer => bail!("This build does not include the gstreamer extractor"),
    }
}

/// `clip.manifest.json` was written for frames extracted into `frames/clip`
fn frames_dir_for(config: &Config, manifest: &Path) -> PathBuf {
    let name = manifest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".manifest.json").unwrap_or(&name);
    config.frames_dir(stem)
}

pub async fn sign_frames(
    config: &Config,
    input: &Path,
    private_key: &str,
    kind: Extractor,
) -> Result<()> {
    let identity = load_identity(private_key)?;
    let signer = FrameSigner::new(identity).with_workers(config.workers);

    let extractor = extractor(config, kind)?;
    let signed = signer
        .sign_video(config, extractor.as_ref(), input, Timestamp::now())
        .await?;

    println!(
        "Signed {} frames at {}",
        signed.manifest.len(),
        signed.manifest.start_timestamp_ms
    );
    println!("manifest:    {}", signed.manifest_path.display());
    println!("certificate: {}", signed.certificate_path.display());
    Ok(())
}

pub async fn verify_frames(
    config: &Config,
    manifest: &Path,
    frames: Option<PathBuf>,
    no_certificate: bool,
) -> Result<()> {
    let frames = frames.unwrap_or_else(|| frames_dir_for(config, manifest));

    let mut verifier = FrameVerifier::new().with_workers(config.workers);
    if no_certificate {
        verifier = verifier.allow_missing_certificate();
    }

    let report = verifier.verify_file(manifest, &frames).await?;

    println!(
        "Verified {} frames signed by {} at {}",
        report.frames, report.signer, report.start_timestamp
    );
    if report.certificate.is_none() {
        println!("No certificate was found, only the frames were checked");
    }
    Ok(())
}

pub async fn sign_file(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    private_key: &str,
) -> Result<()> {
    let identity = load_identity(private_key)?;
    let signer = FileSigner::new(identity, Arc::new(config.tagger()));

    let timestamp = Timestamp::now();
    let signed = match output {
        Some(output) => signer.sign_file(input, &output, timestamp).await?,
        None => signer.sign_into(config, input, timestamp).await?,
    };

    println!(
        "Signed {} at {} ({})",
        input.display(),
        signed.payload.timestamp_ms,
        signed.payload.file_hash_sha256
    );
    println!("output: {}", signed.output.display());
    Ok(())
}

pub async fn verify_file(config: &Config, container: &Path, expected: Option<&str>) -> Result<()> {
    let expected = match expected {
        Some(s) => match Timestamp::parse_strict(s) {
            Some(ts) => Some(ts),
            None => bail!("Expected timestamp {s:?} is not a millisecond epoch timestamp"),
        },
        None => None,
    };

    let report = FileVerifier::new(Arc::new(config.tagger()))
        .verify_file(container, expected)
        .await?;

    println!(
        "Verified {} signed by {} at {} ({})",
        container.display(),
        report.signer_address,
        report.timestamp,
        report.file_hash
    );
    Ok(())
}
