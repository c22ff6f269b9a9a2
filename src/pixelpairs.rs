// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the difference of a pixel pair
//!
//! Given two pixels, the absolute energy between them is taken channel
//! by channel before anything is summed, so a change in red can't be
//! cancelled out by an opposite change in blue.  These are the pair
//! forms of the brightness and luma readers.

use crate::pixels::Palette;
use crate::reader::LUMA_WEIGHTS;

/// The type signature of our pixel pair function.
pub type PixelPair = fn(&Palette, u32, u32) -> f64;

/// (Pixel, Pixel) -> Difference
///
/// Mean absolute difference of the alpha-weighted colour channels.
pub fn brightness_of_pair(palette: &Palette, p1: u32, p2: u32) -> f64 {
    let (a1, a2) = (palette.alpha(p1), palette.alpha(p2));
    let (sum, count) = palette
        .color_channels(p1)
        .zip(palette.color_channels(p2))
        .fold((0.0, 0usize), |(s, n), (c1, c2)| {
            (s + (c1 * a1 - c2 * a2).abs(), n + 1)
        });
    sum / count as f64
}

/// (Pixel, Pixel) -> Difference
///
/// BT.709-weighted absolute difference of the alpha-weighted red,
/// green and blue channels.
pub fn luma_of_pair(palette: &Palette, p1: u32, p2: u32) -> f64 {
    let (a1, a2) = (palette.alpha(p1), palette.alpha(p2));
    palette
        .color(p1)
        .iter()
        .zip(palette.color(p2))
        .zip(LUMA_WEIGHTS.iter())
        .map(|((c1, c2), w)| w * (c1 * a1 - c2 * a2).abs())
        .sum()
}
