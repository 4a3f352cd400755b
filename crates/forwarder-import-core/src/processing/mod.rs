// Core modules
mod cryptographic;
pub mod perceptual;
pub mod types;

// Expose hash calculations
pub use cryptographic::compute_cryptographic;
pub use perceptual::{calculate_phash, phash_from_bytes};
pub use types::{Fingerprint, PHash};

use crate::error::Result;

/// Compute the perceptual hash and content digest of a media payload.
///
/// Fails with [`crate::Error::NotAnImage`] when the bytes do not decode as a raster image.
/// Identical input always yields an identical fingerprint.
pub fn fingerprint(bytes: &[u8]) -> Result<Fingerprint> {
    let perceptual = phash_from_bytes(bytes)?;
    let cryptographic = compute_cryptographic(bytes);

    Ok(Fingerprint {
        perceptual,
        cryptographic,
    })
}

#[cfg(test)]
mod tests;
