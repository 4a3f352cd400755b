use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::platform::BotLogin;

/// Build a deterministic test picture; different seeds give visually different images
pub fn sample_image(seed: u32) -> DynamicImage {
    let img = RgbImage::from_fn(64, 48, |x, y| {
        let r = (x * 4 + seed * 37) % 256;
        let g = ((x ^ y) * (seed + 3)) % 256;
        let b = (y * 5 + (x * y) / (seed + 1)) % 256;
        Rgb([r as u8, g as u8, b as u8])
    });
    DynamicImage::ImageRgb8(img)
}

/// Encode an image into memory
pub fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Bot login that answers from a fixed secret table and records every call
pub struct FakeBotLogin {
    ids: HashMap<String, i64>,
    calls: RefCell<Vec<String>>,
}

impl FakeBotLogin {
    pub fn new(bots: &[(&str, i64)]) -> Self {
        Self {
            ids: bots
                .iter()
                .map(|(secret, id)| (secret.to_string(), *id))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl BotLogin for FakeBotLogin {
    fn bot_identity(&self, secret: &str) -> Result<i64> {
        self.calls.borrow_mut().push(secret.to_string());
        self.ids
            .get(secret)
            .copied()
            .ok_or_else(|| Error::Platform("invalid bot token".to_string()))
    }
}
