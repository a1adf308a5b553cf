//! Synthetic frame sets, standing in for what an extractor writes

use std::path::Path;

use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Size of every synthetic frame
pub const FRAME_SIZE: usize = 4096;

/// The name the extractor gives the `n`th frame (1-based)
pub fn frame_name(n: usize) -> String {
    format!("frame_{n:06}.png")
}

/// The contents of the `n`th frame. The same frame number always gives the
/// same bytes.
pub fn frame_bytes(n: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let mut buf = vec![0; FRAME_SIZE];
    rng.fill_bytes(&mut buf);
    buf
}

/// Writes `count` frames into `dir` and returns their names in order
pub fn write_frames<P: AsRef<Path>>(dir: P, count: usize) -> anyhow::Result<Vec<String>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    (1..=count)
        .map(|n| {
            let name = frame_name(n);
            std::fs::write(dir.join(&name), frame_bytes(n))?;
            Ok(name)
        })
        .collect()
}

/// Flips every bit of the byte at `offset` within the file
pub fn flip_byte<P: AsRef<Path>>(path: P, offset: usize) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut buf = std::fs::read(path)?;
    let byte = buf
        .get_mut(offset)
        .ok_or_else(|| anyhow::anyhow!("{} is shorter than {offset} bytes", path.display()))?;
    *byte = !*byte;
    std::fs::write(path, buf)?;
    Ok(())
}
