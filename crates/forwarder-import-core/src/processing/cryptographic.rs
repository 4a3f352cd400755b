/// Functions for computing the content digest of a media payload
use sha2::{Digest, Sha512};

/// Compute the SHA-512 digest of an in-memory payload as 128 lowercase hex digits
pub fn compute_cryptographic(bytes: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
