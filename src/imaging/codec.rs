//! Decoding uploaded bytes and encoding filter results as JPEG.
//!
//! Output is always baseline JPEG. JPEG has no alpha channel and no palette,
//! so [`prepare_for_jpeg`] flattens everything to either 8-bit luma or 8-bit
//! RGB before the encoder sees it.

use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Upload is empty")]
    Empty,
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Failed to decode {format:?} image: {source}")]
    Malformed {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Cannot encode an image with zero width or height ({width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Decode an in-memory upload, sniffing the format from its magic bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| DecodeError::UnknownFormat)?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    reader
        .decode()
        .map_err(|source| DecodeError::Malformed { format, source })
}

/// Flatten `image` to a layout the JPEG encoder accepts.
///
/// 8-bit luma and RGB pass through untouched; other grayscale layouts
/// without alpha become 8-bit luma; everything else becomes 8-bit RGB.
pub fn prepare_for_jpeg(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Encode `image` as JPEG into `writer`.
pub fn write_jpeg<W: Write>(
    image: &DynamicImage,
    quality: Quality,
    writer: W,
) -> Result<(), EncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        });
    }
    let encoder = JpegEncoder::new_with_quality(writer, quality.value());
    prepare_for_jpeg(image).write_with_encoder(encoder)?;
    Ok(())
}

/// Encode `image` as JPEG into memory.
pub fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    write_jpeg(image, quality, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, gradient_rgb, gradient_rgba};
    use image::{ColorType, GrayImage, Luma};

    #[test]
    fn decode_png_upload() {
        let bytes = encode_png(&gradient_rgb(30, 20));
        let img = decode(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (30, 20));
    }

    #[test]
    fn decode_empty_is_error() {
        assert!(matches!(decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn decode_garbage_is_unknown_format() {
        let result = decode(b"definitely not an image");
        assert!(matches!(result, Err(DecodeError::UnknownFormat)));
    }

    #[test]
    fn decode_truncated_png_is_malformed() {
        let bytes = encode_png(&gradient_rgb(30, 20));
        let result = decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(
            result,
            Err(DecodeError::Malformed {
                format: ImageFormat::Png,
                ..
            })
        ));
    }

    #[test]
    fn prepare_flattens_alpha_to_rgb() {
        let out = prepare_for_jpeg(&gradient_rgba(4, 4));
        assert_eq!(out.color(), ColorType::Rgb8);
    }

    #[test]
    fn prepare_keeps_luma() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([7])));
        assert_eq!(prepare_for_jpeg(&gray).color(), ColorType::L8);
    }

    #[test]
    fn encode_writes_jpeg_markers() {
        let jpeg = encode_jpeg(&gradient_rgba(16, 16), Quality::default()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn encoded_grayscale_decodes_as_single_channel() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 9, Luma([100])));
        let jpeg = encode_jpeg(&gray, Quality::default()).unwrap();
        let back = decode(&jpeg).unwrap();
        assert_eq!(back.color(), ColorType::L8);
        assert_eq!((back.width(), back.height()), (12, 9));
    }

    #[test]
    fn encode_zero_sized_is_error() {
        let empty = DynamicImage::ImageRgb8(image::RgbImage::new(0, 0));
        assert!(matches!(
            encode_jpeg(&empty, Quality::default()),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }
}
