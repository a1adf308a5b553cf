//! The frame pipeline: many small units, one per extracted frame, recorded in
//! a [crate::spec::Manifest] with a detached [crate::file::FrameCertificate].
//!
//! Frames are processed concurrently but always collected in their input
//! order, so frame numbers and manifest order never depend on which frame
//! happened to finish first.

mod listing;
#[cfg(feature = "signing")]
mod sign;
#[cfg(feature = "verifying")]
mod verify;

pub use listing::*;
#[cfg(feature = "signing")]
pub use sign::*;
#[cfg(feature = "verifying")]
pub use verify::*;

/// Human readable name of a frame used in errors and logs
pub(crate) fn frame_artifact(frame_number: usize, filename: &str) -> String {
    format!("frame {frame_number} ({filename})")
}
