//! Image filters and codecs, in pure Rust.
//!
//! | Concern | Module |
//! |---|---|
//! | **Filter selection** | [`filters`]: [`Filter`] enum, [`transform`] |
//! | **Grayscale / sepia / solarize** | `color`: per-pixel maps |
//! | **Blur / edge** | `convolution`: fixed kernels, clamped edges |
//! | **Poster** | `quantize`: median cut to 8 colors |
//! | **Decode / encode** | [`codec`]: format sniffing, JPEG output |
//!
//! Every filter is a pure function of its input image, so filters can run
//! on independent images from as many threads as the caller likes.

pub mod codec;
mod color;
mod convolution;
pub mod filters;
mod params;
mod quantize;

pub use codec::{DecodeError, EncodeError, decode, encode_jpeg, write_jpeg};
pub use filters::{Filter, UnsupportedFilterError, transform};
pub use params::Quality;
