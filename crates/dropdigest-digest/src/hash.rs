//! SHA-256 digest of file content.

use sha2::{Digest, Sha256};

use dropdigest_core::{ContentHash, DigestError, FileContent};

/// Buffers larger than this are hashed on the blocking pool.
pub const BLOCKING_THRESHOLD: usize = 128 * 1024;

/// Compute the SHA-256 of a byte buffer.
pub fn sha256(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    ContentHash::new(out)
}

/// Digest a file's content, consuming the buffer.
///
/// `path` is only used for error context.
pub async fn digest_content(path: &str, content: FileContent) -> Result<ContentHash, DigestError> {
    if content.len() <= BLOCKING_THRESHOLD {
        return Ok(sha256(content.as_bytes()));
    }

    tokio::task::spawn_blocking(move || sha256(content.as_bytes()))
        .await
        .map_err(|e| DigestError::Hash {
            path: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_empty_input() {
        assert_eq!(sha256(b"").to_hex(), EMPTY_SHA256);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            sha256(b"hi").to_hex(),
            "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4"
        );
    }

    #[test]
    fn test_deterministic_and_sensitive() {
        let data = vec![7u8; 4096];
        assert_eq!(sha256(&data), sha256(&data));

        let mut changed = data.clone();
        changed[2048] ^= 1;
        assert_ne!(sha256(&data), sha256(&changed));
    }

    #[test]
    fn test_hex_shape() {
        let hex = sha256(b"anything").to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[tokio::test]
    async fn test_large_buffer_matches_inline() {
        let data = vec![0x42u8; BLOCKING_THRESHOLD + 1];
        let expected = sha256(&data);
        let hash = digest_content("/big.bin", FileContent::Bytes(data)).await.unwrap();
        assert_eq!(hash, expected);
    }

    #[tokio::test]
    async fn test_text_content_hashes_its_bytes() {
        let hash = digest_content("/a.txt", FileContent::Text("abc".into())).await.unwrap();
        assert_eq!(hash, sha256(b"abc"));
    }
}
