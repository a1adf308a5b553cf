//! The whole-file pipeline: a single container carrying its own verification
//! payload as a metadata tag.
//!
//! The payload cannot sign over the bytes it is embedded in, so the digest is
//! always taken over the canonical form of the container (see
//! [crate::canonical]).

#[cfg(feature = "signing")]
mod sign;
#[cfg(feature = "verifying")]
mod verify;

use std::path::Path;

use tempfile::{Builder, TempPath};

#[cfg(feature = "signing")]
pub use sign::*;
#[cfg(feature = "verifying")]
pub use verify::*;

/// Reserves an empty temporary file next to `path`, keeping its extension so
/// that tools choosing a container format by name still pick the right one.
///
/// The file is removed once the returned path is dropped unless it is
/// persisted.
pub(crate) fn temp_sibling(path: &Path) -> std::io::Result<TempPath> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let suffix = extension_suffix(path);
    Ok(Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path())
}

/// Like [temp_sibling] but within the system temporary directory, for
/// intermediates which are never persisted. The directory holding `path` may
/// well be read only.
pub(crate) fn temp_scratch(path: &Path) -> std::io::Result<TempPath> {
    let suffix = extension_suffix(path);
    Ok(Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile()?
        .into_temp_path())
}

const TEMP_PREFIX: &str = ".media-signer-";

fn extension_suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
