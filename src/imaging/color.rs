//! Per-pixel color filters: grayscale, sepia, solarize.
//!
//! None of these look at neighbouring pixels, so each one is a straight map
//! over the RGB buffer.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// ITU-R 601-2 luma coefficients.
pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// Sepia mixing matrix, one row per output channel.
pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Channel values at or above this are inverted by [`solarize`].
pub const SOLARIZE_THRESHOLD: u8 = 128;

#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let l = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    clamp_u8(l)
}

/// Round and saturate a float channel value.
#[inline]
pub fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Single-channel intensity image.
///
/// Already-gray inputs keep their values; color inputs go through 601-2 luma.
/// Alpha is dropped.
pub fn grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
                Luma([luma_u8(r, g, b)])
            })
        }
    }
}

#[inline]
pub fn sepia_pixel(Rgb([r, g, b]): Rgb<u8>) -> Rgb<u8> {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let mix = |row: [f32; 3]| clamp_u8(row[0] * r + row[1] * g + row[2] * b);
    Rgb([
        mix(SEPIA_MATRIX[0]),
        mix(SEPIA_MATRIX[1]),
        mix(SEPIA_MATRIX[2]),
    ])
}

pub fn sepia(image: &DynamicImage) -> RgbImage {
    let mut out = image.to_rgb8();
    for pixel in out.pixels_mut() {
        *pixel = sepia_pixel(*pixel);
    }
    out
}

#[inline]
pub fn solarize_channel(v: u8) -> u8 {
    if v >= SOLARIZE_THRESHOLD { 255 - v } else { v }
}

pub fn solarize(image: &DynamicImage) -> RgbImage {
    let mut out = image.to_rgb8();
    for channel in out.iter_mut() {
        *channel = solarize_channel(*channel);
    }
    out
}
