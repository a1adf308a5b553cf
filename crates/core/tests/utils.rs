#![allow(dead_code)]

use std::{
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use media_signer::{
    Config, FrameSigner, SignedVideo, SigningIdentity, Timestamp,
    spec::Manifest,
    tests::{DirExtractor, MemTagger},
    tools::Tags,
};

pub type TestResult = Result<(), Box<dyn Error>>;

pub fn alice() -> Arc<SigningIdentity> {
    Arc::new(SigningIdentity::from_hex(testlibs::keys::ALICE).expect("Alice's key is valid"))
}

pub fn bob() -> Arc<SigningIdentity> {
    Arc::new(SigningIdentity::from_hex(testlibs::keys::BOB).expect("Bob's key is valid"))
}

/// A scratch directory holding a "video" (a directory of frames, as read by
/// [DirExtractor]) and the output root for a run
pub struct Workspace {
    pub root: PathBuf,
    pub video: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(frames: usize) -> Result<Self, Box<dyn Error>> {
        let root = testlibs::random_temp_dir();
        let video = root.join("clip");
        testlibs::frames::write_frames(&video, frames)?;

        let config = Config {
            out_dir: root.join("output"),
            workers: 4,
            ..Default::default()
        };

        Ok(Self {
            root,
            video,
            config,
        })
    }

    pub async fn sign(&self, timestamp: Timestamp) -> Result<SignedVideo, Box<dyn Error>> {
        let signed = FrameSigner::new(alice())
            .with_workers(self.config.workers)
            .sign_video(&self.config, &DirExtractor, &self.video, timestamp)
            .await?;
        Ok(signed)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Loads, edits and rewrites a manifest in place
pub fn edit_manifest<F: FnOnce(&mut Manifest)>(path: &Path, edit: F) -> TestResult {
    let (mut manifest, _) = Manifest::from_file(path)?;
    edit(&mut manifest);
    manifest.write(path)?;
    Ok(())
}

/// Rewrites a [MemTagger] container, leaving the stream alone unless `stream`
/// is given
pub fn edit_container<F: FnOnce(&mut Tags)>(
    path: &Path,
    stream: Option<&[u8]>,
    edit: F,
) -> TestResult {
    let buf = std::fs::read(path)?;
    let (mut tags, old_stream) = MemTagger::decode(&buf)?;
    edit(&mut tags);
    std::fs::write(
        path,
        MemTagger::encode(&tags, stream.unwrap_or(old_stream)),
    )?;
    Ok(())
}
