//! Tamper-evident provenance for media.
//!
//! Two pipelines share one signature scheme:
//!
//! - [frames]: every extracted frame of a video is hashed and signed, the
//!   records are kept in a manifest next to a detached certificate
//! - [container]: a whole media container is hashed in its canonical form and
//!   the signature is embedded back into it as a metadata tag
//!
//! Every signed message commits to the signing timestamp, which verification
//! proves by checking that the signatures stop verifying once the timestamp is
//! moved on by a single millisecond.

pub mod canonical;
pub mod config;
pub mod container;
pub mod crypto;
mod error;
pub mod file;
pub mod frames;
pub mod spec;
pub mod tools;

pub use config::Config;
pub use crypto::SigningIdentity;
pub use error::*;
pub use file::{Timestamp, time};

#[cfg(feature = "signing")]
pub use container::{FileSigner, SignedFile};
#[cfg(feature = "verifying")]
pub use container::{FileReport, FileVerifier};
#[cfg(feature = "signing")]
pub use frames::{FrameSigner, SignedFrames, SignedVideo};
#[cfg(feature = "verifying")]
pub use frames::{FrameReport, FrameVerdict, FrameVerifier};

#[cfg(any(test, feature = "testlibs"))]
pub mod tests;
