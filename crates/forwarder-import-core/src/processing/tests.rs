use image::ImageOutputFormat;

use crate::error::Error;
use crate::processing::{calculate_phash, compute_cryptographic, fingerprint, PHash};
use crate::test_utils::{encode, sample_image};

#[test]
fn test_cryptographic_hash() {
    // SHA-512 of the empty input
    let expected_hash = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
                         47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";

    assert_eq!(compute_cryptographic(b""), expected_hash);
    assert_eq!(compute_cryptographic(b"abc").len(), 128);
}

#[test]
fn test_fingerprint_is_deterministic() {
    let bytes = encode(&sample_image(1), ImageOutputFormat::Png);

    let first = fingerprint(&bytes).unwrap();
    let second = fingerprint(&bytes).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.perceptual_hash().len(), 16);
    assert_eq!(first.content_digest().len(), 128);
    assert!(first
        .content_digest()
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_lossless_reencode_keeps_phash() {
    let img = sample_image(2);
    let png = encode(&img, ImageOutputFormat::Png);
    let bmp = encode(&img, ImageOutputFormat::Bmp);
    assert_ne!(png, bmp);

    let from_png = fingerprint(&png).unwrap();
    let from_bmp = fingerprint(&bmp).unwrap();

    assert_eq!(from_png.perceptual, from_bmp.perceptual);
    assert_ne!(from_png.content_digest(), from_bmp.content_digest());
}

#[test]
fn test_phash_ne() {
    let phash_img1 = calculate_phash(&sample_image(1));
    let phash_img2 = calculate_phash(&sample_image(9));

    assert_ne!(phash_img1, phash_img2);
}

#[test]
fn test_non_image_is_rejected() {
    let err = fingerprint(b"%PDF-1.7 definitely not a raster image").unwrap_err();
    assert!(matches!(err, Error::NotAnImage(_)));

    let err = fingerprint(&[]).unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_truncated_image_is_rejected() {
    let png = encode(&sample_image(3), ImageOutputFormat::Png);

    let err = fingerprint(&png[..png.len() / 2]).unwrap_err();

    assert!(matches!(err, Error::NotAnImage(_)));
}

#[test]
fn test_phash_display_is_zero_padded_hex() {
    assert_eq!(PHash(0x00ff).to_string(), "00000000000000ff");
    assert_eq!(PHash(u64::MAX).to_string(), "ffffffffffffffff");
}
