use std::path::Path;

use crate::spec::{MANIFEST_SCHEMA, Manifest};

use super::{ParseError, write_atomic};

impl Manifest {
    /// Reads the buffer as the contents of a manifest file, rejecting any
    /// schema or signature scheme this library did not write
    pub fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        let manifest: Manifest = serde_json::from_slice(buf)?;

        if manifest.schema != MANIFEST_SCHEMA {
            return Err(ParseError::Schema(manifest.schema));
        }

        if !manifest.signer.is_supported_scheme() {
            let s = manifest.signer;
            return Err(ParseError::Scheme {
                algorithm: s.algorithm,
                hash: s.hash,
                prefix: s.message_prefix,
            });
        }

        if manifest.start_timestamp_ms.next().is_none() {
            return Err(ParseError::TimestampOutOfRange(
                manifest.start_timestamp_ms.as_millis(),
            ));
        }

        Ok(manifest)
    }

    /// Reads the manifest at the given path, also returning the raw bytes so
    /// that the detached certificate can be checked against exactly what was
    /// on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<u8>), ParseError> {
        let buf = std::fs::read(path)?;
        let manifest = Self::from_buf(&buf)?;
        Ok((manifest, buf))
    }

    /// The exact bytes written to disk, which the certificate digest covers
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ParseError> {
        let mut buf = serde_json::to_vec_pretty(self)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Atomically writes the manifest to the given path
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ParseError> {
        write_atomic(path, &self.to_json_bytes()?)?;
        Ok(())
    }
}
