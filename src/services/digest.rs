//! SHA-256 digests for export manifests.

use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};

/// Read size used while hashing; files are never loaded whole.
pub const DIGEST_CHUNK_SIZE: usize = 4096;

/// Placeholder written to a manifest when a file could not be hashed.
pub const DIGEST_ERROR: &str = "ERROR";

/// Hex-encoded SHA-256 of a file, streamed in [`DIGEST_CHUNK_SIZE`] chunks.
pub fn sha256_file(path: &Utf8Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DIGEST_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Like [`sha256_file`] but logs failures and returns [`DIGEST_ERROR`].
pub fn sha256_or_sentinel(path: &Utf8Path) -> String {
    match sha256_file(path) {
        Ok(hex) => hex,
        Err(e) => {
            tracing::error!("Failed to get SHA256 hash for {}: {}", path, e);
            DIGEST_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digest() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"abc").unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_spanning_several_chunks_is_stable() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..DIGEST_CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        let first = sha256_file(&path).unwrap();
        let second = sha256_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_missing_file_yields_sentinel() {
        let path = Utf8PathBuf::from("/definitely/not/here.pk3");
        assert!(sha256_file(&path).is_err());
        assert_eq!(sha256_or_sentinel(&path), DIGEST_ERROR);
    }
}
