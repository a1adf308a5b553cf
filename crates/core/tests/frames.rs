mod utils;

use std::fs;

use media_signer::{
    AttestError, FrameSetMismatch, FrameVerdict, FrameVerifier, Timestamp,
    crypto::{build_message, hash_message, sha256_hex},
    file::{FrameCertificate, ParseError},
    spec::{Manifest, encode_prefixed},
};
use testlibs::frames::{flip_byte, frame_bytes, frame_name};
use utils::{TestResult, Workspace, edit_manifest};

#[tokio::test]
async fn sign_and_verify() -> TestResult {
    let ws = Workspace::new(10)?;
    let signed = ws.sign(Timestamp::now()).await?;

    assert_eq!(signed.manifest.len(), 10);
    assert!(signed.manifest_path.exists());
    assert!(signed.certificate_path.exists());

    let report = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await?;

    assert_eq!(report.frames, 10);
    assert_eq!(report.start_timestamp, signed.manifest.start_timestamp_ms);
    assert_eq!(report.signer.to_string(), testlibs::keys::ALICE_ADDRESS);
    assert_eq!(report.certificate, Some(signed.certificate_path));

    Ok(())
}

#[tokio::test]
async fn two_frames_at_1000() -> TestResult {
    let ws = Workspace::new(2)?;
    let signed = ws.sign(Timestamp::from_millis(1000)).await?;

    let manifest = &signed.manifest;
    assert_eq!(*manifest.start_timestamp_ms, 1000);

    for (i, record) in manifest.frames.iter().enumerate() {
        let n = i + 1;
        let digest = sha256_hex(&frame_bytes(n));
        assert_eq!(record.filename, frame_name(n));
        assert_eq!(record.frame_hash_sha256, digest);
        assert_eq!(
            record.message,
            format!(r#"{{"startTimestampMs":1000,"frameNumber":{n},"frameHashSha256":"{digest}"}}"#)
        );
        assert_eq!(record.message_hash, encode_prefixed(hash_message(&record.message)));
        assert!(matches!(record.signature.v(), 27 | 28));
    }

    let verifier = FrameVerifier::new();
    let verdicts = verifier
        .check_frames(manifest, &signed.frames_dir, Timestamp::from_millis(1000))
        .await?;
    assert!(verdicts.iter().all(FrameVerdict::is_verified));

    let shifted = verifier
        .check_frames(manifest, &signed.frames_dir, Timestamp::from_millis(1001))
        .await?;
    assert_eq!(shifted.len(), 2);
    assert!(shifted.iter().all(|v| !v.is_verified()));

    verifier
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await?;

    Ok(())
}

#[tokio::test]
async fn shifted_timestamp_rejects_every_frame() -> TestResult {
    let ws = Workspace::new(25)?;
    let ts = Timestamp::from_millis(1_700_000_000_000);
    let signed = ws.sign(ts).await?;

    let verdicts = FrameVerifier::new()
        .check_frames(&signed.manifest, &signed.frames_dir, ts + 1)
        .await?;

    let rejected = verdicts.iter().filter(|v| !v.is_verified()).count();
    assert_eq!(rejected, 25);

    Ok(())
}

#[tokio::test]
async fn substituted_timestamp() -> TestResult {
    let ws = Workspace::new(3)?;
    let signed = ws.sign(Timestamp::from_millis(1000)).await?;

    edit_manifest(&signed.manifest_path, |m| {
        m.start_timestamp_ms = Timestamp::from_millis(1001);
    })?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(
        matches!(res, Err(AttestError::MessageMismatch { .. })),
        "Stored messages no longer match: {res:?}"
    );

    Ok(())
}

#[tokio::test]
async fn substituted_timestamp_and_messages() -> TestResult {
    let ws = Workspace::new(3)?;
    let signed = ws.sign(Timestamp::from_millis(1000)).await?;

    // A forger rewriting every message consistently still cannot produce
    // matching signatures
    edit_manifest(&signed.manifest_path, |m| {
        let ts = Timestamp::from_millis(1001);
        m.start_timestamp_ms = ts;
        for record in &mut m.frames {
            record.message = build_message(ts, record.frame_number, &record.frame_hash_sha256);
            record.message_hash = encode_prefixed(hash_message(&record.message));
        }
    })?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    match res {
        Err(AttestError::SignatureInvalid { artifact, outcome }) => {
            assert!(artifact.contains(&frame_name(1)));
            assert!(!outcome.address_matches);
        }
        res => panic!("Expected an invalid signature, got {res:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn tampered_frame() -> TestResult {
    let ws = Workspace::new(5)?;
    let signed = ws.sign(Timestamp::now()).await?;

    flip_byte(signed.frames_dir.join(frame_name(3)), 100)?;

    let verifier = FrameVerifier::new();
    let verdicts = verifier
        .check_frames(
            &signed.manifest,
            &signed.frames_dir,
            signed.manifest.start_timestamp_ms,
        )
        .await?;

    for (i, verdict) in verdicts.iter().enumerate() {
        if i == 2 {
            assert!(matches!(verdict, FrameVerdict::DigestMismatch { .. }));
        } else {
            assert_eq!(*verdict, FrameVerdict::Verified, "Frame {} is untouched", i + 1);
        }
    }

    let res = verifier
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    match res {
        Err(AttestError::DigestMismatch { artifact, .. }) => {
            assert!(artifact.contains("frame 3"));
        }
        res => panic!("Expected a digest mismatch, got {res:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn swapped_filenames() -> TestResult {
    let ws = Workspace::new(4)?;
    let signed = ws.sign(Timestamp::now()).await?;

    edit_manifest(&signed.manifest_path, |m| {
        let first = m.frames[0].filename.clone();
        m.frames[0].filename = m.frames[1].filename.clone();
        m.frames[1].filename = first;
    })?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(matches!(
        res,
        Err(AttestError::FrameSetMismatch(FrameSetMismatch::Name { index: 1, .. }))
    ));

    Ok(())
}

#[tokio::test]
async fn extra_and_missing_frames() -> TestResult {
    let ws = Workspace::new(4)?;
    let signed = ws.sign(Timestamp::now()).await?;
    let verifier = FrameVerifier::new();

    let extra = signed.frames_dir.join(frame_name(5));
    fs::write(&extra, frame_bytes(5))?;
    let res = verifier
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(matches!(
        res,
        Err(AttestError::FrameSetMismatch(FrameSetMismatch::Count {
            expected: 4,
            found: 5
        }))
    ));

    fs::remove_file(extra)?;
    fs::remove_file(signed.frames_dir.join(frame_name(2)))?;
    let res = verifier
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(matches!(
        res,
        Err(AttestError::FrameSetMismatch(FrameSetMismatch::Count {
            expected: 4,
            found: 3
        }))
    ));

    Ok(())
}

#[tokio::test]
async fn tampered_manifest_is_caught_by_certificate() -> TestResult {
    let ws = Workspace::new(3)?;
    let signed = ws.sign(Timestamp::now()).await?;

    // Frames still verify, only the certificate can notice this
    edit_manifest(&signed.manifest_path, |m| {
        m.input = "other.mp4".to_string();
    })?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    match res {
        Err(AttestError::DigestMismatch { artifact, .. }) => {
            assert!(artifact.starts_with("certificate"));
        }
        res => panic!("Expected the certificate to be rejected, got {res:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn certificate_from_another_signer() -> TestResult {
    let ws = Workspace::new(2)?;
    let signed = ws.sign(Timestamp::now()).await?;

    let mut certificate = FrameCertificate::from_file(&signed.certificate_path)?;
    let message = media_signer::crypto::build_file_message(
        certificate.start_timestamp,
        &certificate.manifest_sha256,
    );
    certificate.signature = media_signer::crypto::sign(&utils::bob(), &message)?.signature;
    certificate.write(&signed.certificate_path)?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(matches!(res, Err(AttestError::SignatureInvalid { .. })));

    Ok(())
}

#[tokio::test]
async fn missing_certificate_is_rejected() -> TestResult {
    let ws = Workspace::new(3)?;
    let signed = ws.sign(Timestamp::from_millis(1_700_000_000_000)).await?;
    fs::remove_file(&signed.certificate_path)?;

    // Nothing else covers the input identifier
    edit_manifest(&signed.manifest_path, |m| {
        m.input = "some-other-video.mp4".to_string();
    })?;

    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    match res {
        Err(AttestError::InputMissing(path)) => assert_eq!(path, signed.certificate_path),
        res => panic!("Expected the missing certificate to be rejected, got {res:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn missing_certificate_can_be_allowed() -> TestResult {
    let ws = Workspace::new(2)?;
    let signed = ws.sign(Timestamp::now()).await?;
    fs::remove_file(&signed.certificate_path)?;

    let report = FrameVerifier::new()
        .allow_missing_certificate()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await?;
    assert_eq!(report.certificate, None);

    Ok(())
}

#[tokio::test]
async fn last_signable_millisecond() -> TestResult {
    let ws = Workspace::new(2)?;

    let res = ws.sign(Timestamp::from_millis(u64::MAX)).await;
    assert!(res.is_err(), "A timestamp without successor is refused");

    let signed = ws.sign(Timestamp::from_millis(u64::MAX - 1)).await?;
    FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await?;

    // A manifest claiming the last millisecond is malformed, not uncommitted
    edit_manifest(&signed.manifest_path, |m| {
        m.start_timestamp_ms = Timestamp::from_millis(u64::MAX);
    })?;
    let res = FrameVerifier::new()
        .verify_file(&signed.manifest_path, &signed.frames_dir)
        .await;
    assert!(matches!(
        res,
        Err(AttestError::MalformedManifest(ParseError::TimestampOutOfRange(_)))
    ));

    Ok(())
}

#[tokio::test]
async fn resigning_replaces_stale_frames() -> TestResult {
    let ws = Workspace::new(3)?;
    let first = ws.sign(Timestamp::from_millis(1000)).await?;
    fs::write(first.frames_dir.join("frame_999999.png"), b"stale")?;

    let second = ws.sign(Timestamp::from_millis(2000)).await?;
    assert_eq!(second.manifest.len(), 3);

    let (on_disk, _) = Manifest::from_file(&second.manifest_path)?;
    assert_eq!(*on_disk.start_timestamp_ms, 2000);

    Ok(())
}
