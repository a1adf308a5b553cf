use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use serde::Deserialize;

use super::{CollaboratorError, FrameExtractor, TagRewriter, Tags, run_tool};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// Pattern the extracted frames are written with, zero padded so that the
/// lexicographic order is the frame order
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// Extracts every decoded frame as a PNG with `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    pub ffmpeg: PathBuf,
    pub timeout: Duration,
}

impl FfmpegExtractor {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_TOOL_TIMEOUT)
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            let args: Vec<OsString> = vec![
                "-hide_banner".into(),
                "-loglevel".into(),
                "error".into(),
                "-y".into(),
                "-i".into(),
                input.into(),
                // One image per decoded frame, no duplication or dropping
                "-fps_mode".into(),
                "passthrough".into(),
                out_dir.join(FRAME_PATTERN).into(),
            ];

            run_tool(&self.ffmpeg, args, self.timeout).await?;
            Ok(())
        }
        .boxed()
    }
}

/// Reads tags with `ffprobe` and rewrites them with a stream copying `ffmpeg`
/// remux
#[derive(Debug, Clone)]
pub struct FfmpegTagger {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub timeout: Duration,
}

impl FfmpegTagger {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(ffmpeg: P, ffprobe: Q, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout,
        }
    }

    /// Arguments for a remux which drops every tag, sets `tags` and copies
    /// all streams. The bitexact flags stop the muxer adding its own encoder
    /// tag or creation time, which would make the output irreproducible.
    pub fn rewrite_args(input: &Path, output: &Path, tags: &Tags) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
            "-map".into(),
            "0".into(),
            "-c".into(),
            "copy".into(),
            "-map_metadata".into(),
            "-1".into(),
            "-map_chapters".into(),
            "-1".into(),
            "-fflags".into(),
            "+bitexact".into(),
            "-flags:v".into(),
            "+bitexact".into(),
            "-flags:a".into(),
            "+bitexact".into(),
            "-movflags".into(),
            "use_metadata_tags".into(),
        ];

        for (k, v) in tags {
            args.push("-metadata".into());
            args.push(format!("{k}={v}").into());
        }

        args.push(output.into());
        args
    }
}

impl Default for FfmpegTagger {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", DEFAULT_TOOL_TIMEOUT)
    }
}

#[derive(Deserialize, Default)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Deserialize, Default)]
struct ProbeFormat {
    #[serde(default)]
    tags: Tags,
}

impl TagRewriter for FfmpegTagger {
    fn read_tags<'a>(&'a self, input: &'a Path) -> BoxFuture<'a, Result<Tags, CollaboratorError>> {
        async move {
            let args: Vec<OsString> = vec![
                "-v".into(),
                "error".into(),
                "-show_entries".into(),
                "format_tags".into(),
                "-of".into(),
                "json".into(),
                input.into(),
            ];

            let out = run_tool(&self.ffprobe, args, self.timeout).await?;

            let probe: ProbeOutput =
                serde_json::from_slice(&out.stdout).map_err(|e| CollaboratorError::Output {
                    tool: self.ffprobe.display().to_string(),
                    reason: e.to_string(),
                })?;

            Ok(probe.format.tags)
        }
        .boxed()
    }

    fn rewrite<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        tags: &'a Tags,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            run_tool(&self.ffmpeg, Self::rewrite_args(input, output, tags), self.timeout).await?;
            Ok(())
        }
        .boxed()
    }
}
