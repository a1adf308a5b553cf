pub mod frames;
pub mod keys;

use std::{env, path::PathBuf};

pub use anyhow;
use rand::distr::SampleString;

fn random_name() -> String {
    // Assumption that we won't have any collisions
    rand::distr::Alphanumeric.sample_string(&mut rand::rng(), 16)
}

/// Returns a path to a file in the temporary directory which does not exist
/// yet. Callers are expected to clean it up.
pub fn random_temp_file() -> String {
    env::temp_dir()
        .join(format!("media-signer-{}", random_name()))
        .to_string_lossy()
        .into_owned()
}

/// Creates and returns a fresh, empty directory within the temporary
/// directory
pub fn random_temp_dir() -> PathBuf {
    let dir = env::temp_dir().join(format!("media-signer-{}", random_name()));
    std::fs::create_dir_all(&dir).expect("Could not create temporary directory");
    dir
}
