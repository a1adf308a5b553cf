//! In-memory stand-ins for the external tools, so the pipelines can be
//! exercised without `ffmpeg` installed


pub use extractor::*;
pub use tagger::*;
