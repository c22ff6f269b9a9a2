// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel readers
//!
//! A reader turns one colour record into the scalar that the finite
//! differences of the standard energy are taken over.  Every reader
//! returns a value in `[0, 1]`, premultiplied by alpha where the image
//! has one, so a transparent pixel reads as black.

use crate::errors::ConfigError;
use crate::pixels::Palette;
use std::str::FromStr;

/// The type signature every scalar reader shares.
pub type ReadFn = fn(&Palette, u32) -> f64;

/// ITU-R BT.709 luma weights.
pub(crate) const LUMA_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderType {
    /// Mean of the colour channels.
    Brightness,
    /// BT.709 weighted sum of red, green and blue.  Images without
    /// RGB channels read brightness instead.
    Luma,
    /// HSL lightness: the midpoint of the largest and smallest colour
    /// channel.
    Lightness,
}

impl FromStr for ReaderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brightness" => Ok(ReaderType::Brightness),
            "luma" => Ok(ReaderType::Luma),
            "lightness" => Ok(ReaderType::Lightness),
            _ => Err(ConfigError::Setting(format!("unknown reader '{}'", s))),
        }
    }
}

/// Average of the non-alpha channels, weighted by alpha.
pub fn read_brightness(palette: &Palette, id: u32) -> f64 {
    let (sum, count) = palette
        .color_channels(id)
        .fold((0.0, 0usize), |(s, n), c| (s + c, n + 1));
    sum * palette.alpha(id) / count as f64
}

/// BT.709 luma of the first three channels, weighted by alpha.
pub fn read_luma(palette: &Palette, id: u32) -> f64 {
    let sum: f64 = palette
        .color(id)
        .iter()
        .zip(LUMA_WEIGHTS.iter())
        .map(|(c, w)| c * w)
        .sum();
    sum * palette.alpha(id)
}

/// HSL lightness, weighted by alpha.
pub fn read_lightness(palette: &Palette, id: u32) -> f64 {
    let (lo, hi) = palette
        .color_channels(id)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c), hi.max(c))
        });
    (lo + hi) / 2.0 * palette.alpha(id)
}
