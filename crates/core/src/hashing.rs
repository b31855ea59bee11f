//! SHA-256 hex digest used to fingerprint uploaded image files.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(sha256_hex(b"rev-1"), sha256_hex(b"rev-2"));
        assert_eq!(sha256_hex(b"rev-1").len(), 64);
    }
}
