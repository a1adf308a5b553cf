//! The primitives shared by both pipelines: content digests, the signed
//! message layouts and the secp256k1 signature scheme.

mod digest;
mod engine;
mod key;
mod message;

pub use digest::*;
pub use engine::*;
pub use key::*;
pub use message::*;
