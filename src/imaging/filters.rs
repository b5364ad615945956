//! Filter selection and dispatch.
//!
//! [`Filter`] is the closed set of transformations the pipeline offers. Each
//! variant maps to one pure function in [`color`](super::color),
//! [`convolution`](super::convolution) or [`quantize`](super::quantize); the
//! dispatch is a plain `match`, so adding a filter means adding a variant and
//! the compiler points at every place that needs updating.
//!
//! | Name | Input normalized to | Output |
//! |---|---|---|
//! | `grayscale` | RGB | Luma8 |
//! | `sepia` | RGB | Rgb8 |
//! | `poster` | RGB | Rgb8, at most 8 colors |
//! | `blur` | Luma8 / Rgba8 / Rgb8 | same as input |
//! | `edge` | Luma8 | Luma8 |
//! | `solarize` | RGB | Rgb8 |

use super::{color, convolution, quantize};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported filter: {name:?} (expected one of: {expected})")]
pub struct UnsupportedFilterError {
    pub name: String,
    expected: String,
}

impl UnsupportedFilterError {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            expected: Filter::ALL
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A pixel-level transformation identified by a fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[serde(alias = "gray")]
    Grayscale,
    Sepia,
    Poster,
    Blur,
    Edge,
    #[serde(alias = "solar")]
    Solarize,
}

impl Filter {
    pub const ALL: [Filter; 6] = [
        Filter::Grayscale,
        Filter::Sepia,
        Filter::Poster,
        Filter::Blur,
        Filter::Edge,
        Filter::Solarize,
    ];

    /// Canonical name, used for storage and artifact naming.
    pub fn name(self) -> &'static str {
        match self {
            Filter::Grayscale => "grayscale",
            Filter::Sepia => "sepia",
            Filter::Poster => "poster",
            Filter::Blur => "blur",
            Filter::Edge => "edge",
            Filter::Solarize => "solarize",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Filter::Grayscale => "Grayscale",
            Filter::Sepia => "Sepia",
            Filter::Poster => "Poster",
            Filter::Blur => "Blur",
            Filter::Edge => "Edge Detection",
            Filter::Solarize => "Solarize",
        }
    }

    /// Apply the filter. The input is never modified.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Filter::Grayscale => DynamicImage::ImageLuma8(color::grayscale(image)),
            Filter::Sepia => DynamicImage::ImageRgb8(color::sepia(image)),
            Filter::Poster => DynamicImage::ImageRgb8(quantize::posterize(
                &image.to_rgb8(),
                quantize::POSTER_COLORS,
            )),
            Filter::Blur => convolution::blur(image),
            Filter::Edge => DynamicImage::ImageLuma8(convolution::edges(image)),
            Filter::Solarize => DynamicImage::ImageRgb8(color::solarize(image)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = UnsupportedFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grayscale" | "gray" => Ok(Filter::Grayscale),
            "sepia" => Ok(Filter::Sepia),
            "poster" => Ok(Filter::Poster),
            "blur" => Ok(Filter::Blur),
            "edge" => Ok(Filter::Edge),
            "solarize" | "solar" => Ok(Filter::Solarize),
            other => Err(UnsupportedFilterError::new(other)),
        }
    }
}

/// Resolve `filter_name` and apply it to `image`.
pub fn transform(
    image: &DynamicImage,
    filter_name: &str,
) -> Result<DynamicImage, UnsupportedFilterError> {
    let filter: Filter = filter_name.parse()?;
    Ok(filter.apply(image))
}
