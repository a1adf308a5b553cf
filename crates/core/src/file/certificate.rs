use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::spec::{Address, Signature};

use super::{ParseError, Timestamp, write_atomic};

const MANIFEST_SUFFIX: &str = ".manifest.json";
const CERTIFICATE_SUFFIX: &str = ".cert.txt";

/// A detached certificate over a whole manifest file.
///
/// It signs `{timestamp, manifest digest}` so that the manifest as a whole has
/// an integrity anchor which is independent of any single frame. On disk it
/// is a handful of `key=value` lines:
///
/// The input identifier is a JSON string, since file names may hold any
/// character including newlines.
///
/// ```txt
/// input="video.mp4"
/// startTimestampMs=1700000000000
/// manifestSha256=…
/// signerAddress=0x…
/// signature=0x…
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCertificate {
    pub input: String,
    pub start_timestamp: Timestamp,
    pub manifest_sha256: String,
    pub signer: Address,
    pub signature: Signature,
}

impl FrameCertificate {
    pub fn from_buf(buf: &str) -> Result<Self, ParseError> {
        let mut input = None;
        let mut start_timestamp = None;
        let mut manifest_sha256 = None;
        let mut signer = None;
        let mut signature = None;

        for (i, line) in buf.lines().enumerate() {
            let line_no = i + 1;
            let err = |reason: String| ParseError::Certificate {
                line: line_no,
                reason,
            };

            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| err("expected key=value".to_string()))?;

            match key {
                "input" => {
                    input = Some(serde_json::from_str::<String>(value).map_err(|e| err(format!("{e}")))?)
                }
                "startTimestampMs" => {
                    start_timestamp = Some(value.parse::<Timestamp>().map_err(|e| err(format!("{e}")))?)
                }
                "manifestSha256" => manifest_sha256 = Some(value.to_string()),
                "signerAddress" => signer = Some(value.parse::<Address>().map_err(|e| err(format!("{e}")))?),
                "signature" => signature = Some(value.parse::<Signature>().map_err(|e| err(format!("{e}")))?),
                k => return Err(err(format!("unknown key {k:?}"))),
            }
        }

        let missing = |key: &str| ParseError::Certificate {
            line: 0,
            reason: format!("missing {key}"),
        };

        Ok(Self {
            input: input.ok_or_else(|| missing("input"))?,
            start_timestamp: start_timestamp.ok_or_else(|| missing("startTimestampMs"))?,
            manifest_sha256: manifest_sha256.ok_or_else(|| missing("manifestSha256"))?,
            signer: signer.ok_or_else(|| missing("signerAddress"))?,
            signature: signature.ok_or_else(|| missing("signature"))?,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let buf = std::fs::read_to_string(path)?;
        Self::from_buf(&buf)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ParseError> {
        write_atomic(path, self.to_string().as_bytes())?;
        Ok(())
    }

    /// Where the certificate for the given manifest lives:
    /// `name.manifest.json` becomes `name.cert.txt`
    pub fn path_for<P: AsRef<Path>>(manifest: P) -> PathBuf {
        let manifest = manifest.as_ref();
        let name = manifest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let stem = name.strip_suffix(MANIFEST_SUFFIX).unwrap_or(&name);
        manifest.with_file_name(format!("{stem}{CERTIFICATE_SUFFIX}"))
    }

    /// The manifest path for media with the given stem
    pub fn manifest_name(stem: &str) -> String {
        format!("{stem}{MANIFEST_SUFFIX}")
    }
}

impl Display for FrameCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "input={}", Value::from(self.input.as_str()))?;
        writeln!(f, "startTimestampMs={}", self.start_timestamp)?;
        writeln!(f, "manifestSha256={}", self.manifest_sha256)?;
        writeln!(f, "signerAddress={}", self.signer)?;
        writeln!(f, "signature={}", self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate() -> FrameCertificate {
        FrameCertificate {
            input: "video.mp4".to_string(),
            start_timestamp: Timestamp::from_millis(1_700_000_000_000),
            manifest_sha256: "ab".repeat(32),
            signer: testlibs::keys::ALICE_ADDRESS.parse().unwrap(),
            signature: Signature::from_parts(&[7; 64], 0),
        }
    }

    #[test]
    fn write_and_read() {
        let path = testlibs::random_temp_file() + CERTIFICATE_SUFFIX;
        certificate().write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("input=\"video.mp4\"\nstartTimestampMs=1700000000000\n"));

        let read = FrameCertificate::from_file(&path).unwrap();
        assert_eq!(read, certificate());

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn awkward_input_names() {
        for name in ["clip\nsignature=0x00.mp4", "a \"quoted\" name.mp4", "tab\there=.mp4"] {
            let cert = FrameCertificate {
                input: name.to_string(),
                ..certificate()
            };

            let read = FrameCertificate::from_buf(&cert.to_string()).unwrap();
            assert_eq!(read, cert);
        }
    }

    #[test]
    fn unquoted_input() {
        let res = FrameCertificate::from_buf("input=video.mp4\n");
        assert!(matches!(res, Err(ParseError::Certificate { line: 1, .. })));
    }

    #[test]
    fn missing_field() {
        let buf = "input=\"video.mp4\"\nstartTimestampMs=1\n";
        let res = FrameCertificate::from_buf(buf);
        assert!(matches!(res, Err(ParseError::Certificate { line: 0, .. })));
    }

    #[test]
    fn bad_line() {
        let res = FrameCertificate::from_buf("input=\"a\"\nnonsense\n");
        assert!(matches!(res, Err(ParseError::Certificate { line: 2, .. })));
    }

    #[test]
    fn paths() {
        assert_eq!(
            FrameCertificate::path_for("/out/manifests/clip.manifest.json"),
            PathBuf::from("/out/manifests/clip.cert.txt")
        );
        assert_eq!(
            FrameCertificate::path_for("other.json"),
            PathBuf::from("other.json.cert.txt")
        );
        assert_eq!(FrameCertificate::manifest_name("clip"), "clip.manifest.json");
    }
}
