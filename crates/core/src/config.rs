use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use crate::{
    file::FrameCertificate,
    tools::{DEFAULT_TOOL_TIMEOUT, FfmpegExtractor, FfmpegTagger},
};

/// Everything a run needs to know which is not part of the protocol itself:
/// where to put its outputs, how wide to fan out and how to reach the
/// external tools.
///
/// This is built once (normally from the command line) and passed down
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root for `frames/`, `manifests/` and `signed/`
    pub out_dir: PathBuf,
    /// Upper bound on frames being hashed and signed at once
    pub workers: usize,
    /// Hard limit on any single external tool invocation
    pub tool_timeout: Duration,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            workers: default_workers(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Config {
    /// Where frames extracted from media with the given stem are written
    pub fn frames_dir(&self, stem: &str) -> PathBuf {
        self.out_dir.join("frames").join(stem)
    }

    pub fn manifest_path(&self, stem: &str) -> PathBuf {
        self.out_dir
            .join("manifests")
            .join(FrameCertificate::manifest_name(stem))
    }

    /// `clip.mp4` is delivered as `signed/clip.signed.mp4`
    pub fn signed_path(&self, input: &Path) -> PathBuf {
        let stem = media_stem(input);
        let name = match input.extension() {
            Some(ext) => format!("{stem}.signed.{}", ext.to_string_lossy()),
            None => format!("{stem}.signed"),
        };
        self.out_dir.join("signed").join(name)
    }

    pub fn extractor(&self) -> FfmpegExtractor {
        FfmpegExtractor::new(&self.ffmpeg, self.tool_timeout)
    }

    pub fn tagger(&self) -> FfmpegTagger {
        FfmpegTagger::new(&self.ffmpeg, &self.ffprobe, self.tool_timeout)
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// The file name of the media without its extension
pub fn media_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string())
}

/// The identifier recorded for the media in manifests and certificates
pub fn media_identifier(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let config = Config {
            out_dir: PathBuf::from("/out"),
            ..Default::default()
        };

        assert_eq!(config.frames_dir("clip"), PathBuf::from("/out/frames/clip"));
        assert_eq!(
            config.manifest_path("clip"),
            PathBuf::from("/out/manifests/clip.manifest.json")
        );
        assert_eq!(
            config.signed_path(Path::new("/videos/clip.mp4")),
            PathBuf::from("/out/signed/clip.signed.mp4")
        );
    }

    #[test]
    fn identifiers() {
        assert_eq!(media_identifier(Path::new("/videos/clip.mp4")), "clip.mp4");
        assert_eq!(media_stem(Path::new("/videos/clip.mp4")), "clip");
        assert!(default_workers() >= 1);
    }
}
