//! Median-cut palette reduction for the `poster` filter.
//!
//! The color histogram is split recursively along the channel with the
//! widest spread, at the population-weighted median, until there are as many
//! boxes as palette entries. Each box contributes its weighted mean color,
//! and every pixel is then mapped to the nearest palette entry.

use image::{Rgb, RgbImage};
use std::collections::HashMap;

pub const POSTER_COLORS: usize = 8;

type Color = [u8; 3];

#[derive(Debug, Clone)]
struct ColorBox {
    /// Distinct colors in this box with their pixel counts.
    colors: Vec<(Color, u32)>,
}

impl ColorBox {
    /// Widest channel and its extent.
    fn widest_channel(&self) -> (usize, u8) {
        (0..3)
            .map(|c| {
                let (lo, hi) = self
                    .colors
                    .iter()
                    .fold((u8::MAX, u8::MIN), |(lo, hi), (color, _)| {
                        (lo.min(color[c]), hi.max(color[c]))
                    });
                (c, hi.saturating_sub(lo))
            })
            .max_by_key(|&(c, range)| (range, std::cmp::Reverse(c)))
            .unwrap_or((0, 0))
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors.sort_unstable_by_key(|(color, _)| color[channel]);

        let total: u64 = self.colors.iter().map(|(_, n)| *n as u64).sum();
        let mut running = 0u64;
        let mut at = self.colors.len() - 1;
        for (i, (_, n)) in self.colors.iter().enumerate() {
            running += *n as u64;
            if running * 2 >= total {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.colors.len() - 1);
        let upper = self.colors.split_off(at);
        (self, ColorBox { colors: upper })
    }

    fn mean(&self) -> Color {
        let mut sums = [0u64; 3];
        let mut total = 0u64;
        for (color, n) in &self.colors {
            for c in 0..3 {
                sums[c] += color[c] as u64 * *n as u64;
            }
            total += *n as u64;
        }
        let total = total.max(1);
        sums.map(|s| ((s + total / 2) / total) as u8)
    }
}

/// Build a palette of at most `max_colors` entries for `image`.
pub fn median_cut_palette(image: &RgbImage, max_colors: usize) -> Vec<Color> {
    let mut histogram: HashMap<Color, u32> = HashMap::new();
    for pixel in image.pixels() {
        *histogram.entry(pixel.0).or_insert(0) += 1;
    }

    let mut colors: Vec<(Color, u32)> = histogram.into_iter().collect();
    colors.sort_unstable();
    if max_colors == 0 || colors.is_empty() {
        return Vec::new();
    }
    if colors.len() <= max_colors {
        return colors.into_iter().map(|(c, _)| c).collect();
    }

    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(i, b)| (b.widest_channel().1, std::cmp::Reverse(*i)))
            .map(|(i, _)| i);
        let Some(index) = candidate else { break };
        let (lower, upper) = boxes.swap_remove(index).split();
        boxes.push(lower);
        boxes.push(upper);
    }

    let mut palette: Vec<Color> = boxes.iter().map(ColorBox::mean).collect();
    palette.sort_unstable();
    palette.dedup();
    palette
}

fn nearest(palette: &[Color], color: Color) -> Color {
    palette
        .iter()
        .copied()
        .min_by_key(|p| {
            (0..3)
                .map(|c| {
                    let d = p[c] as i32 - color[c] as i32;
                    d * d
                })
                .sum::<i32>()
        })
        .unwrap_or(color)
}

/// Reduce `image` to at most `max_colors` distinct colors.
pub fn posterize(image: &RgbImage, max_colors: usize) -> RgbImage {
    let palette = median_cut_palette(image, max_colors);
    let mut lookup: HashMap<Color, Color> = HashMap::new();
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let mapped = *lookup
            .entry(pixel.0)
            .or_insert_with(|| nearest(&palette, pixel.0));
        *pixel = Rgb(mapped);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_rgb;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn distinct_colors(img: &RgbImage) -> usize {
        img.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
    }

    #[test]
    fn few_colors_are_kept_exactly() {
        let img = RgbImage::from_fn(4, 4, |x, _| {
            if x < 2 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        assert_eq!(posterize(&img, POSTER_COLORS), img);
    }

    #[test]
    fn gradient_is_reduced_to_eight_colors() {
        let img = gradient_rgb(64, 64).to_rgb8();
        assert!(distinct_colors(&img) > POSTER_COLORS);
        let out = posterize(&img, POSTER_COLORS);
        assert!(distinct_colors(&out) <= POSTER_COLORS);
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn palette_stays_within_source_bounds() {
        let img = RgbImage::from_fn(16, 1, |x, _| Rgb([(x * 10) as u8, 50, 50]));
        let palette = median_cut_palette(&img, 4);
        assert_eq!(palette.len(), 4);
        for color in palette {
            assert!(color[0] <= 150);
            assert_eq!(color[1], 50);
        }
    }

    #[test]
    fn zero_palette_size_leaves_image_untouched() {
        let img = gradient_rgb(5, 5).to_rgb8();
        assert_eq!(posterize(&img, 0), img);
    }

    #[test]
    fn empty_image_is_handled() {
        let img = RgbImage::new(0, 0);
        assert!(median_cut_palette(&img, POSTER_COLORS).is_empty());
        assert_eq!(posterize(&img, POSTER_COLORS).dimensions(), (0, 0));
    }

    proptest! {
        #[test]
        fn poster_never_exceeds_eight_colors(
            pixels in proptest::collection::vec(any::<[u8; 3]>(), 1..200)
        ) {
            let width = pixels.len() as u32;
            let img = RgbImage::from_fn(width, 1, |x, _| Rgb(pixels[x as usize]));
            let out = posterize(&img, POSTER_COLORS);
            prop_assert!(distinct_colors(&out) <= POSTER_COLORS);
        }
    }
}
