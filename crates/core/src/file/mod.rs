//! This module stores all tools for reading and writing the durable outputs
//! of a signing run: the frame manifest and its detached certificate.
//!
//! Every write goes through a temporary file which is renamed into place so a
//! partially written manifest can never be mistaken for a valid one.

mod atomic;
mod certificate;
mod error;
mod manifest;
pub mod time;

pub use atomic::*;
pub use certificate::*;
pub use error::*;
pub use time::{MIN_TIMESTAMP_DIGITS, Timestamp};
