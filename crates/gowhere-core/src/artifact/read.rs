use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ExtractError;
use crate::report::model::{ArtifactHash, ArtifactInfo};

/// Raw executable bytes plus the fingerprint reported alongside them.
#[derive(Debug, Clone)]
pub struct ArtifactContext {
    /// Path the bytes were read from (informational only).
    pub path: String,

    /// Exact bytes read from disk.
    pub bytes: Vec<u8>,

    pub size_bytes: u64,

    pub hash_alg: String,

    /// Hex-encoded hash of the bytes.
    pub hash_hex: String,
}

impl ArtifactContext {
    /// Convert into the report-facing artifact metadata, dropping the bytes.
    pub fn into_artifact(self) -> ArtifactInfo {
        ArtifactInfo {
            path: Some(self.path),
            size_bytes: self.size_bytes,
            hash: ArtifactHash {
                algorithm: self.hash_alg,
                value: self.hash_hex,
            },
        }
    }
}

/// Read an executable in one open/read/close cycle.
///
/// The handle is opened read-only and dropped before this function returns,
/// on the error paths included.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, ExtractError> {
    let io_err = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = {
        let mut file = File::open(path).map_err(io_err)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_err)?;
        bytes
    };
    tracing::debug!(path = %path.display(), size = bytes.len(), "read executable");

    Ok(bytes)
}

/// Read an executable and fingerprint it for a report.
///
/// Only the bytes feed the hash; timestamps and permissions are ignored.
pub fn read_artifact(path: &Path) -> Result<ArtifactContext, ExtractError> {
    let bytes = read_bytes(path)?;
    let digest = Sha256::digest(&bytes);

    Ok(ArtifactContext {
        path: path.display().to_string(),
        size_bytes: bytes.len() as u64,
        bytes,
        hash_alg: "sha256".to_string(),
        hash_hex: hex::encode(digest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_artifact(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_bytes_and_computes_stable_hash() {
        let data = b"gowhere-test";
        let file = temp_artifact(data);

        let ctx = read_artifact(file.path()).expect("artifact read succeeds");

        assert_eq!(ctx.bytes, data);
        assert_eq!(ctx.size_bytes, data.len() as u64);
        assert_eq!(ctx.hash_alg, "sha256");

        // echo -n "gowhere-test" | sha256sum
        assert_eq!(
            ctx.hash_hex,
            "f12af08d2d365403e6f7b3a02beb2ed6276899509edb8806ce148891b9000452"
        );
    }

    #[test]
    fn empty_file_is_readable() {
        let file = temp_artifact(b"");
        let ctx = read_artifact(file.path()).unwrap();

        assert!(ctx.bytes.is_empty());
        assert_eq!(ctx.size_bytes, 0);
    }

    #[test]
    fn read_bytes_returns_exact_contents() {
        let file = temp_artifact(b"\x7fELF\x02");
        assert_eq!(read_bytes(file.path()).unwrap(), b"\x7fELF\x02");
        assert!(matches!(
            read_bytes(Path::new("non_existent_gowhere_binary")),
            Err(ExtractError::Io { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let err = read_artifact(Path::new("non_existent_gowhere_binary")).unwrap_err();

        match err {
            ExtractError::Io { path, source } => {
                assert_eq!(path, Path::new("non_existent_gowhere_binary"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn converts_to_report_artifact() {
        let ctx = ArtifactContext {
            path: "tool".into(),
            bytes: vec![0x7f, b'E', b'L', b'F'],
            size_bytes: 4,
            hash_alg: "sha256".into(),
            hash_hex: "abcd".into(),
        };

        let artifact = ctx.into_artifact();
        assert_eq!(artifact.path, Some("tool".into()));
        assert_eq!(artifact.size_bytes, 4);
        assert_eq!(artifact.hash.value, "abcd");
    }
}
