use std::{io, path::Path};

use sha2::Sha256;
use sha3::{Digest, Keccak256};
use tokio::{fs::File, io::AsyncReadExt};

/// How much of a file to read into memory at once while hashing it
const READ_BLOCK_SIZE: usize = 64 * 1024;

/// SHA-256 of the data as 64 lowercase hex characters. This is the one
/// content hash used for frames, containers and manifests.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Streams the file through SHA-256 without holding it all in memory
pub async fn sha256_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0; READ_BLOCK_SIZE];

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha256() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn known_keccak256() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[tokio::test]
    async fn file_matches_buffer() {
        let path = testlibs::random_temp_file();
        // Larger than one read block so the streaming path is exercised
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let from_file = sha256_file(&path).await.unwrap();
        assert_eq!(from_file, sha256_hex(&data));

        std::fs::remove_file(path).unwrap();
    }
}
