//! Frame extraction through GStreamer rather than an external process.
//!
//! The pipeline created looks as follows, with only video pads of the source
//! being linked:
//!
//! ```txt
//! uridecodebin -> videoconvert -> appsink caps=video/x-raw,format=RGB
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use gst::prelude::*;
use gst_app::AppSink;
use tracing::warn;

use super::{CollaboratorError, DEFAULT_TOOL_TIMEOUT, FrameExtractor};

const TOOL: &str = "gstreamer";

fn output_err<S: ToString>(reason: S) -> CollaboratorError {
    CollaboratorError::Output {
        tool: TOOL.to_string(),
        reason: reason.to_string(),
    }
}

/// Decodes every frame in process and writes them as RGB PNGs using the same
/// naming as [super::FRAME_PATTERN]
#[derive(Debug, Clone)]
pub struct GstExtractor {
    /// How long to wait for the next frame before giving up
    pub frame_timeout: Duration,
}

impl Default for GstExtractor {
    fn default() -> Self {
        Self {
            frame_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl GstExtractor {
    fn build_pipeline(input: &Path) -> Result<(gst::Pipeline, AppSink), CollaboratorError> {
        let uri = file_uri(input)?;
        Self::link_pipeline(uri).map_err(output_err)
    }

    fn link_pipeline(uri: String) -> Result<(gst::Pipeline, AppSink), glib::BoolError> {

        let pipeline = gst::Pipeline::default();
        let src = gst::ElementFactory::make("uridecodebin")
            .property("uri", uri)
            .build()?;
        let convert = gst::ElementFactory::make("videoconvert").build()?;
        let sink = AppSink::builder()
            .caps(
                &gst_video::VideoCapsBuilder::new()
                    .format(gst_video::VideoFormat::Rgb)
                    .build(),
            )
            .sync(false)
            .drop(false)
            .build();

        pipeline.add_many([&src, &convert, sink.upcast_ref::<gst::Element>()])?;
        convert.link(&sink)?;

        let convert_weak = convert.downgrade();
        src.connect_pad_added(move |_, pad| {
            let Some(convert) = convert_weak.upgrade() else {
                return;
            };

            let is_video = pad
                .current_caps()
                .and_then(|c| c.structure(0).map(|s| s.name().starts_with("video/")))
                .unwrap_or(false);
            if !is_video {
                return;
            }

            if let Some(sink_pad) = convert.static_pad("sink") {
                if !sink_pad.is_linked() {
                    // The pipeline then never produces a frame, which drain
                    // reports as a timeout
                    if let Err(e) = pad.link(&sink_pad) {
                        warn!(pad = %pad.name(), "Could not link video pad: {e}");
                    }
                }
            }
        });

        Ok((pipeline, sink))
    }

    fn extract_blocking(&self, input: &Path, out_dir: &Path) -> Result<(), CollaboratorError> {
        gst::init().map_err(output_err)?;

        let input = std::fs::canonicalize(input).map_err(output_err)?;
        let (pipeline, sink) = Self::build_pipeline(&input)?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(output_err)?;

        let res = self.drain(&pipeline, &sink, out_dir);
        let _ = pipeline.set_state(gst::State::Null);
        res
    }

    fn drain(
        &self,
        pipeline: &gst::Pipeline,
        sink: &AppSink,
        out_dir: &Path,
    ) -> Result<(), CollaboratorError> {
        let bus = pipeline
            .bus()
            .ok_or_else(|| output_err("pipeline has no bus"))?;
        let timeout = gst::ClockTime::from_nseconds(self.frame_timeout.as_nanos() as u64);

        let mut idx = 0;
        loop {
            if let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error]) {
                if let gst::MessageView::Error(e) = msg.view() {
                    return Err(output_err(e.error()));
                }
            }

            match sink.try_pull_sample(timeout) {
                Some(sample) => {
                    idx += 1;
                    write_frame(&sample, &out_dir.join(format!("frame_{idx:06}.png")))?;
                }
                None if sink.is_eos() => return Ok(()),
                None => {
                    return Err(CollaboratorError::Timeout {
                        tool: TOOL.to_string(),
                        timeout: self.frame_timeout,
                    });
                }
            }
        }
    }
}

/// A `file://` URI for an absolute path, escaping whatever a URI cannot hold
fn file_uri(path: &Path) -> Result<String, CollaboratorError> {
    glib::filename_to_uri(path, None)
        .map(|uri| uri.to_string())
        .map_err(output_err)
}

fn write_frame(sample: &gst::Sample, path: &Path) -> Result<(), CollaboratorError> {
    let caps = sample.caps().ok_or_else(|| output_err("sample has no caps"))?;
    let info = gst_video::VideoInfo::from_caps(caps).map_err(output_err)?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| output_err("sample has no buffer"))?;
    let frame =
        gst_video::VideoFrameRef::from_buffer_ref_readable(buffer, &info).map_err(output_err)?;

    let (width, height) = (info.width(), info.height());
    let stride = frame.plane_stride()[0] as usize;
    let data = frame.plane_data(0).map_err(output_err)?;

    // Rows may be padded, so copy them out one at a time
    let row = width as usize * 3;
    let mut rgb = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let line = data
            .get(start..start + row)
            .ok_or_else(|| output_err("frame is smaller than its caps"))?;
        rgb.extend_from_slice(line);
    }

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| output_err("frame buffer does not match its size"))?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(output_err)
}

impl FrameExtractor for GstExtractor {
    fn extract<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        let this = self.clone();
        let input: PathBuf = input.to_path_buf();
        let out_dir: PathBuf = out_dir.to_path_buf();

        async move {
            tokio::task::spawn_blocking(move || this.extract_blocking(&input, &out_dir))
                .await
                .map_err(output_err)?
        }
        .boxed()
    }
}
