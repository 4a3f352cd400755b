/// PHash and fingerprint types
///
use std::fmt;

/// A 64-bit DCT perceptual hash (8x8 low-frequency block)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PHash(pub u64);

impl fmt::Display for PHash {
    // Row-major bits, most significant first, as 16 lowercase hex digits
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Both hashes computed for a single media payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Perceptual hash of the decoded image, used as the dedup key
    pub perceptual: PHash,
    /// SHA-512 of the exact payload bytes, as lowercase hex
    pub cryptographic: String,
}

impl Fingerprint {
    /// Perceptual hash rendered as a fixed-length string
    pub fn perceptual_hash(&self) -> String {
        self.perceptual.to_string()
    }

    /// Content digest rendered as lowercase hex
    pub fn content_digest(&self) -> String {
        self.cryptographic.clone()
    }
}
