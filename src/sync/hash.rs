//! Content hashing for sync operations.
//!
//! One SHA256 fingerprint is used at every call site: CLI uploads, server
//! side recomputation, GitHub blobs, and API key lookup. Identical text
//! always yields an identical fingerprint, whoever computes it.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA256 of a text blob.
///
/// # Example
///
/// ```
/// let hash = hub::sync::content_hash("hello");
/// assert_eq!(hash.len(), 64);
/// ```
#[must_use]
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash("# Notes\n");
        let hash2 = content_hash("# Notes\n");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        assert_ne!(content_hash("a"), content_hash("b"));
        assert_ne!(content_hash("a"), content_hash("a "));
    }
}
