// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel storage
//!
//! The carver never moves colour data around.  Every distinct colour
//! in the image is recorded once in a `Palette`, and the image itself
//! is a grid of indices into that palette (a `Canvas`).  Removing or
//! inserting a seam rewrites a row of indices; the palette only ever
//! grows.

use crate::errors::ConfigError;
use crate::twodmap::TwoDimensionalMap;
use std::collections::HashMap;

/// The colour layout of an image.  Luma reading needs real red, green
/// and blue channels, so it is only available for `Rgb` and `Rgba`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Grey,
    GreyA,
    Rgb,
    Rgba,
    /// Any other channel count, with the alpha channel (if any) given
    /// by `RawImage::alpha_channel`.
    Custom,
}

impl ImageType {
    /// The conventional layout for a channel count and alpha position.
    pub fn infer(channels: usize, alpha_channel: Option<usize>) -> ImageType {
        match (channels, alpha_channel) {
            (1, None) => ImageType::Grey,
            (2, Some(1)) => ImageType::GreyA,
            (3, None) => ImageType::Rgb,
            (4, Some(3)) => ImageType::Rgba,
            _ => ImageType::Custom,
        }
    }

    pub(crate) fn has_rgb(self) -> bool {
        self == ImageType::Rgb || self == ImageType::Rgba
    }
}

/// A plain 8-bit interleaved pixel buffer: what the carver is built
/// from and what it hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub image_type: ImageType,
    pub alpha_channel: Option<usize>,
    pub data: Vec<u8>,
}

impl RawImage {
    /// Describe an interleaved buffer, inferring the image type from
    /// the channel count and alpha position.
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        alpha_channel: Option<usize>,
        data: Vec<u8>,
    ) -> Result<Self, ConfigError> {
        let image = RawImage {
            width,
            height,
            channels,
            image_type: ImageType::infer(channels, alpha_channel),
            alpha_channel,
            data,
        };
        image.validate()?;
        Ok(image)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Setting(format!(
                "image must not be empty ({}x{})",
                self.width, self.height
            )));
        }
        if self.channels == 0 {
            return Err(ConfigError::Channels("an image needs at least one channel".into()));
        }
        if let Some(alpha) = self.alpha_channel {
            if alpha >= self.channels {
                return Err(ConfigError::Channels(format!(
                    "alpha channel {} out of range for {} channels",
                    alpha, self.channels
                )));
            }
            if self.channels == 1 {
                return Err(ConfigError::Channels("an alpha channel needs a colour channel too".into()));
            }
        }
        match (self.image_type, self.channels, self.alpha_channel) {
            (ImageType::Custom, _, _)
            | (ImageType::Grey, 1, None)
            | (ImageType::GreyA, 2, Some(_))
            | (ImageType::Rgb, 3, None)
            | (ImageType::Rgba, 4, Some(_)) => {}
            (t, c, a) => {
                return Err(ConfigError::Channels(format!(
                    "{:?} does not describe {} channels with alpha {:?}",
                    t, c, a
                )))
            }
        }
        let expected = self.width as usize * self.height as usize * self.channels;
        if self.data.len() != expected {
            return Err(ConfigError::BufferSize {
                actual: self.data.len(),
                expected,
                width: self.width,
                height: self.height,
                channels: self.channels,
            });
        }
        Ok(())
    }
}

/// The arena of colour records.  Each record is `channels` values
/// normalised to `[0, 1]`; a record never changes once interned.
#[derive(Debug, Clone)]
pub struct Palette {
    channels: usize,
    alpha_channel: Option<usize>,
    values: Vec<f64>,
    lookup: HashMap<Vec<u64>, u32>,
}

impl Palette {
    pub fn new(channels: usize, alpha_channel: Option<usize>) -> Self {
        Palette {
            channels,
            alpha_channel,
            values: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn alpha_channel(&self) -> Option<usize> {
        self.alpha_channel
    }

    /// Number of distinct colours recorded.
    pub fn len(&self) -> usize {
        self.values.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record a colour, returning the index of the existing record if
    /// the exact colour is already present.
    pub fn intern(&mut self, color: &[f64]) -> u32 {
        debug_assert_eq!(color.len(), self.channels);
        let key: Vec<u64> = color.iter().map(|c| c.to_bits()).collect();
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = self.len() as u32;
        self.values.extend_from_slice(color);
        self.lookup.insert(key, id);
        id
    }

    pub fn color(&self, id: u32) -> &[f64] {
        let start = id as usize * self.channels;
        &self.values[start..start + self.channels]
    }

    /// Alpha of a record; fully opaque when the image has no alpha.
    pub fn alpha(&self, id: u32) -> f64 {
        self.alpha_channel.map_or(1.0, |a| self.color(id)[a])
    }

    /// The colour channels of a record, alpha excluded.
    pub fn color_channels(&self, id: u32) -> impl Iterator<Item = f64> + '_ {
        let alpha = self.alpha_channel;
        self.color(id)
            .iter()
            .enumerate()
            .filter(move |(k, _)| Some(*k) != alpha)
            .map(|(_, v)| *v)
    }

    /// Channel-wise mean of two records, interned.
    pub(crate) fn blend(&mut self, a: u32, b: u32) -> u32 {
        let mixed: Vec<f64> = self
            .color(a)
            .iter()
            .zip(self.color(b))
            .map(|(x, y)| (x + y) / 2.0)
            .collect();
        self.intern(&mixed)
    }
}

/// An image as the carver sees it: a grid of palette indices, plus an
/// optional per-pixel rigidity mask that travels with the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub pixels: TwoDimensionalMap<u32>,
    pub rigidity: Option<TwoDimensionalMap<f64>>,
}

impl Canvas {
    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    /// Intern every pixel of a raw buffer into `palette`.
    pub(crate) fn from_raw(raw: &RawImage, palette: &mut Palette) -> Canvas {
        let mut pixels = TwoDimensionalMap::new(raw.width, raw.height);
        let mut color = vec![0.0; raw.channels];
        for (i, chunk) in raw.data.chunks(raw.channels).enumerate() {
            for (c, v) in color.iter_mut().zip(chunk) {
                *c = f64::from(*v) / 255.0;
            }
            let (x, y) = (i as u32 % raw.width, i as u32 / raw.width);
            pixels[(x, y)] = palette.intern(&color);
        }
        Canvas {
            pixels,
            rigidity: None,
        }
    }

    /// Flatten back into an 8-bit interleaved buffer.
    pub(crate) fn to_raw(&self, palette: &Palette, image_type: ImageType) -> RawImage {
        let data = self
            .pixels
            .as_slice()
            .iter()
            .flat_map(|&id| palette.color(id).iter())
            .map(|v| (v * 255.0).round().max(0.0).min(255.0) as u8)
            .collect();
        RawImage {
            width: self.width(),
            height: self.height(),
            channels: palette.channels(),
            image_type,
            alpha_channel: palette.alpha_channel(),
            data,
        }
    }
}
