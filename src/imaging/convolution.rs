//! Fixed-kernel convolutions for the `blur` and `edge` filters.
//!
//! Both kernels are constant; there is no radius or strength knob. Pixels
//! outside the image are sampled by clamping coordinates to the nearest edge,
//! so output dimensions always match the input.

use super::color;
use image::{DynamicImage, GrayImage, ImageBuffer, Pixel};

/// A square convolution kernel with integer weights.
#[derive(Debug, Clone, Copy)]
pub struct Kernel<const N: usize> {
    pub weights: [[i32; N]; N],
    pub divisor: i32,
    pub offset: i32,
}

/// 5×5 ring: every border tap weighs 1, the interior 3×3 is zero.
pub const BLUR: Kernel<5> = Kernel {
    weights: [
        [1, 1, 1, 1, 1],
        [1, 0, 0, 0, 1],
        [1, 0, 0, 0, 1],
        [1, 0, 0, 0, 1],
        [1, 1, 1, 1, 1],
    ],
    divisor: 16,
    offset: 0,
};

/// 3×3 Laplacian-style edge detector.
pub const FIND_EDGES: Kernel<3> = Kernel {
    weights: [[-1, -1, -1], [-1, 8, -1], [-1, -1, -1]],
    divisor: 1,
    offset: 0,
};

/// Convolve every channel of `input` with `kernel`.
pub fn convolve<P, const N: usize>(
    input: &ImageBuffer<P, Vec<u8>>,
    kernel: &Kernel<N>,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = input.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let radius = (N / 2) as i64;
    let src: &[u8] = input.as_raw();
    let mut out = vec![0u8; src.len()];

    if width == 0 || height == 0 {
        return ImageBuffer::from_raw(width, height, out).unwrap_or_else(|| input.clone());
    }

    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let mut acc = vec![0i32; channels];

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            acc.iter_mut().for_each(|a| *a = 0);
            for (ky, row) in kernel.weights.iter().enumerate() {
                let sy = (y + ky as i64 - radius).clamp(0, max_y);
                for (kx, &w) in row.iter().enumerate() {
                    if w == 0 {
                        continue;
                    }
                    let sx = (x + kx as i64 - radius).clamp(0, max_x);
                    let base = (sy as usize * width as usize + sx as usize) * channels;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += w * src[base + c] as i32;
                    }
                }
            }
            let base = (y as usize * width as usize + x as usize) * channels;
            for (c, a) in acc.iter().enumerate() {
                let v = *a as f32 / kernel.divisor as f32 + kernel.offset as f32;
                out[base + c] = color::clamp_u8(v);
            }
        }
    }

    // Same dimensions and channel count as the input, so this cannot fail.
    ImageBuffer::from_raw(width, height, out).unwrap_or_else(|| input.clone())
}

/// Smooth with [`BLUR`].
///
/// Luma stays luma and alpha-carrying images stay RGBA (alpha is blurred
/// like any other channel); every other layout is normalized to RGB first.
pub fn blur(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(convolve(gray, &BLUR)),
        other if other.color().has_alpha() => {
            DynamicImage::ImageRgba8(convolve(&other.to_rgba8(), &BLUR))
        }
        other => DynamicImage::ImageRgb8(convolve(&other.to_rgb8(), &BLUR)),
    }
}

/// Convert to intensity, then apply [`FIND_EDGES`].
pub fn edges(image: &DynamicImage) -> GrayImage {
    convolve(&color::grayscale(image), &FIND_EDGES)
}
