//! The data formats produced and consumed by the signing pipelines: the frame
//! manifest, the embedded whole-file payload and the primitive types they are
//! built from.
//!
//! However note that reading and writing these to disk lives in [crate::file]

mod address;
mod constants;
mod encoding;
mod identity;
mod manifest;
mod payload;
mod signature;

pub use address::*;
pub use constants::*;
pub use encoding::{decode_prefixed, encode_prefixed, is_lower_hex};
pub use identity::*;
pub use manifest::*;
pub use payload::*;
pub use signature::*;
