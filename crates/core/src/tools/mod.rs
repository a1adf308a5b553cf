//! The external collaborators the pipelines depend on.
//!
//! Neither of these is part of the signing protocol, they just turn media into
//! the artifacts which get hashed. Each is a trait so that the pipelines can
//! be driven by any implementation, by default shelling out to `ffmpeg`.

mod error;
mod ffmpeg;
#[cfg(feature = "gstreamer")]
mod gstreamer;
mod process;

use std::{collections::BTreeMap, path::Path};

use futures::future::BoxFuture;

pub use error::*;
pub use ffmpeg::*;
#[cfg(feature = "gstreamer")]
pub use gstreamer::*;
pub use process::*;

/// Metadata tags of a container, sorted by key
pub type Tags = BTreeMap<String, String>;

/// Decodes a video into an ordered sequence of image files.
///
/// The only contract consumed is that, once finished, listing `out_dir` and
/// sorting the names lexicographically gives the frame order.
pub trait FrameExtractor: Sync + Send {
    fn extract<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>>;
}

/// Reads and rewrites the metadata tags of a media container.
///
/// [TagRewriter::rewrite] must clear every existing tag, set exactly `tags`
/// and copy the encoded streams bit-for-bit, so that rewriting an already
/// rewritten container with the same tags gives identical bytes.
pub trait TagRewriter: Sync + Send {
    fn read_tags<'a>(&'a self, input: &'a Path) -> BoxFuture<'a, Result<Tags, CollaboratorError>>;

    fn rewrite<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        tags: &'a Tags,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>>;
}
