//! # Perceptual Hashing Module
//!
//! DCT-based perceptual hashing for collapsing visually identical media.
//!
//! ## Overview
//!
//! Perceptual hashing generates "fingerprints" that stay the same for visually identical images,
//! unlike cryptographic hashes where a re-encode produces a completely different output.
//! Channel media is frequently re-uploaded after a round trip through another client, so the
//! bytes differ while the picture does not.
//!
//! ## Algorithm
//!
//! 1. Decode the payload and convert it to grayscale
//! 2. Resize to 32×32 with a Lanczos3 filter
//! 3. Run a 2D DCT-II over the 32×32 grid
//! 4. Keep the top-left 8×8 block (the lowest frequencies)
//! 5. Set one bit per coefficient that is above the block median
//!
//! Bits are packed row-major, most significant first, so the rendered string is the
//! usual 16 hex digit pHash representation.
//!
//! ## References
//!
//! - "Implementation and analysis of DCT based global perceptual image hashing" by Bian Yang, et al.
//! - "Perceptual Hashing: Robust Image Identification" by Nasir Memon and Savvas A. Chatzichristofis

use image::{imageops::FilterType, DynamicImage};
use rustdct::{Dct2, DctPlanner};

use super::types::PHash;
use crate::error::Result;

/// Side of the grayscale grid fed to the DCT
const IMG_SIZE: usize = 32;

/// Side of the low-frequency block that forms the hash
const HASH_SIZE: usize = 8;

/// Calculate a 64-bit DCT perceptual hash for a decoded image
pub fn calculate_phash(img: &DynamicImage) -> PHash {
    let small = img
        .grayscale()
        .resize_exact(IMG_SIZE as u32, IMG_SIZE as u32, FilterType::Lanczos3)
        .to_luma8();

    let mut pixels: Vec<f32> = small.as_raw().iter().map(|&v| f32::from(v)).collect();
    dct_2d(&mut pixels, IMG_SIZE);

    let mut low = [0.0f32; HASH_SIZE * HASH_SIZE];
    for y in 0..HASH_SIZE {
        for x in 0..HASH_SIZE {
            low[y * HASH_SIZE + x] = pixels[y * IMG_SIZE + x];
        }
    }

    let median = median(&low);
    let hash = low
        .iter()
        .fold(0u64, |hash, &coefficient| (hash << 1) | u64::from(coefficient > median));

    PHash(hash)
}

/// Calculate a perceptual hash from an encoded image in memory
pub fn phash_from_bytes(bytes: &[u8]) -> Result<PHash> {
    let img = image::load_from_memory(bytes)?;
    Ok(calculate_phash(&img))
}

// Separable 2D DCT-II: rows in place, then columns through a scratch buffer
fn dct_2d(pixels: &mut [f32], size: usize) {
    let mut planner = DctPlanner::<f32>::new();
    let dct = planner.plan_dct2(size);

    for row in pixels.chunks_exact_mut(size) {
        dct.process_dct2(row);
    }

    let mut column = vec![0.0f32; size];
    for x in 0..size {
        for y in 0..size {
            column[y] = pixels[y * size + x];
        }
        dct.process_dct2(&mut column);
        for y in 0..size {
            pixels[y * size + x] = column[y];
        }
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
