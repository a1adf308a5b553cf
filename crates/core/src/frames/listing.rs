use std::path::Path;

use crate::AttestError;

/// Lists the names of the regular files in the directory, sorted
/// lexicographically, which is the frame order
pub async fn list_frames<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, AttestError> {
    let dir = dir.as_ref();
    let unreadable = |source| AttestError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        if entry.file_type().await.map_err(unreadable)?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}
