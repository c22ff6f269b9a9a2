// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - The main object
//!
//! A `SeamCarver` owns one image and everything learned about it.  The
//! first dimension to be carved (the width, unless configured
//! otherwise) gets a visibility map over the original image; the
//! second gets a visibility map over the first dimension's result.
//! Resizing to a new size ranks only the seams not ranked yet, so
//! going back and forth between sizes costs next to nothing.
//!
//! The original image and every rank survive a resize.  A resize that
//! fails leaves the carver showing exactly what it showed before.

use crate::config::{CarverConfig, EnergySettings, ResizeOrder};
use crate::cq;
use crate::energy::{calculate_energy, EnergyFunction};
use crate::errors::{CarveError, ConfigError};
use crate::flipper::{unflip, Flipper, Orientation};
use crate::pixels::{Canvas, ImageType, Palette, RawImage};
use crate::progress::{NoProgress, Progress, Ticker};
use crate::twodmap::TwoDimensionalMap;
use crate::vmap::VisibilityMap;
use image::{GenericImageView, ImageBuffer, Pixel, Primitive};
use itertools::iproduct;
use num_traits::NumCast;
use tracing::debug;

// The second dimension's map, and the first-pass image it ranks.  It is
// only good for as long as the first dimension stays at `size`.
#[derive(Debug, Clone)]
struct Stage {
    size: u32,
    base: Canvas,
    vmap: VisibilityMap,
}

fn distance(from: u32, to: u32) -> u32 {
    cq!(from > to, from - to, to - from)
}

/// A struct for holding the image to be carved.
#[derive(Debug, Clone)]
pub struct SeamCarver {
    config: CarverConfig,
    function: EnergyFunction,
    image_type: ImageType,
    palette: Palette,
    original: Canvas,
    primary: VisibilityMap,
    secondary: Option<Stage>,
    current: Canvas,
}

impl SeamCarver {
    /// Creates a new SeamCarver with the default configuration.
    pub fn new(image: RawImage) -> Result<Self, ConfigError> {
        Self::with_config(image, CarverConfig::default())
    }

    /// Creates a new SeamCarver, checking the image and the
    /// configuration against each other.
    pub fn with_config(image: RawImage, config: CarverConfig) -> Result<Self, ConfigError> {
        image.validate()?;
        let mut palette = Palette::new(image.channels, image.alpha_channel);
        let original = Canvas::from_raw(&image, &mut palette);
        Self::assemble(config, image.image_type, palette, original)
    }

    /// Creates a new SeamCarver from anything the `image` crate can
    /// view.  8-bit, 16-bit and floating-point subpixels are all
    /// accepted.
    pub fn from_image<I, P, S>(image: &I, config: CarverConfig) -> Result<Self, ConfigError>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ConfigError::Setting(format!(
                "image must not be empty ({}x{})",
                width, height
            )));
        }
        let channels = <usize as From<u8>>::from(P::CHANNEL_COUNT);
        let alpha_channel = match P::COLOR_MODEL {
            "RGBA" | "YA" => Some(channels - 1),
            _ => None,
        };
        let max = <f64 as NumCast>::from(S::DEFAULT_MAX_VALUE).unwrap_or(1.0);

        let mut palette = Palette::new(channels, alpha_channel);
        let mut pixels = TwoDimensionalMap::new(width, height);
        let mut color = vec![0.0; channels];
        for (y, x) in iproduct!(0..height, 0..width) {
            let pixel = image.get_pixel(x, y);
            for (c, v) in color.iter_mut().zip(pixel.channels()) {
                *c = <f64 as NumCast>::from(*v).map_or(0.0, |v| v / max);
            }
            pixels[(x, y)] = palette.intern(&color);
        }
        let original = Canvas {
            pixels,
            rigidity: None,
        };
        Self::assemble(
            config,
            ImageType::infer(channels, alpha_channel),
            palette,
            original,
        )
    }

    fn assemble(
        config: CarverConfig,
        image_type: ImageType,
        palette: Palette,
        original: Canvas,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let function = EnergyFunction::bind(config.energy, image_type)?;
        let primary = VisibilityMap::new(&original, config.resize_order.first());
        debug!(
            width = original.width(),
            height = original.height(),
            colors = palette.len(),
            ?image_type,
            "carver ready"
        );
        Ok(SeamCarver {
            config,
            function,
            image_type,
            palette,
            current: original.clone(),
            original,
            primary,
            secondary: None,
        })
    }

    pub fn config(&self) -> &CarverConfig {
        &self.config
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn channels(&self) -> usize {
        self.palette.channels()
    }

    /// Size of the image as it currently stands.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.current.width(), self.current.height())
    }

    pub fn width(&self) -> u32 {
        self.current.width()
    }

    pub fn height(&self) -> u32 {
        self.current.height()
    }

    pub fn original_dimensions(&self) -> (u32, u32) {
        (self.original.width(), self.original.height())
    }

    /// Number of distinct colours recorded, inserted blends included.
    pub fn color_count(&self) -> usize {
        self.palette.len()
    }

    /// Every size `resize` will accept, as (min width, min height) and
    /// (max width, max height).
    pub fn size_limits(&self) -> ((u32, u32), (u32, u32)) {
        let (width, height) = self.original_dimensions();
        (
            (self.config.min_width.min(width), self.config.min_height.min(height)),
            (self.config.max_size(width), self.config.max_size(height)),
        )
    }

    // Forget every rank.  The current image is kept.
    fn reset_cache(&mut self) {
        self.primary = VisibilityMap::new(&self.original, self.config.resize_order.first());
        self.secondary = None;
    }

    /// Choose a different energy function.  An invalid choice changes
    /// nothing; a valid one discards every rank learned so far.
    pub fn set_energy_function(&mut self, settings: EnergySettings) -> Result<(), ConfigError> {
        let function = EnergyFunction::bind(settings, self.image_type)?;
        self.function = function;
        self.config.energy = settings;
        self.reset_cache();
        debug!(?settings, "energy function bound");
        Ok(())
    }

    /// Replace the whole configuration.  Ranks are discarded only when
    /// the new configuration would rank seams differently.
    pub fn reconfigure(&mut self, config: CarverConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let function = EnergyFunction::bind(config.energy, self.image_type)?;
        let stale = config.energy != self.config.energy
            || config.rigidity != self.config.rigidity
            || config.resize_order != self.config.resize_order;
        self.function = function;
        self.config = config;
        if stale {
            self.reset_cache();
        }
        Ok(())
    }

    pub fn set_resize_order(&mut self, order: ResizeOrder) -> Result<(), ConfigError> {
        let config = self.config.clone().with_resize_order(order);
        self.reconfigure(config)
    }

    pub fn set_rigidity(&mut self, rigidity: f64) -> Result<(), ConfigError> {
        let config = self.config.clone().with_rigidity(rigidity);
        self.reconfigure(config)
    }

    /// Attach a per-pixel cost mask, the size of the original image.
    /// Each value, between 0 and 1, is added to its pixel's energy, and
    /// scales the rigidity charged for sideways seam steps through it.
    pub fn set_rigidity_mask(&mut self, mask: TwoDimensionalMap<f64>) -> Result<(), ConfigError> {
        let (width, height) = self.original_dimensions();
        if mask.dimensions() != (width, height) {
            return Err(ConfigError::MaskDimensions {
                mask_width: mask.width,
                mask_height: mask.height,
                width,
                height,
            });
        }
        if let Some(i) = mask
            .as_slice()
            .iter()
            .position(|v| !(0.0..=1.0).contains(v))
        {
            return Err(ConfigError::MaskValue {
                x: i as u32 % width,
                y: i as u32 / width,
            });
        }
        self.original.rigidity = Some(mask);
        self.reset_cache();
        Ok(())
    }

    /// Make the current image the new original, discarding all ranks.
    pub fn flatten(&mut self) {
        self.original = self.current.clone();
        self.reset_cache();
    }

    fn check_target(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        let ((min_width, min_height), (max_width, max_height)) = self.size_limits();
        if width < min_width || height < min_height || width > max_width || height > max_height {
            return Err(ConfigError::TargetSize {
                width,
                height,
                min_width,
                min_height,
                max_width,
                max_height,
            });
        }
        Ok(())
    }

    /// Given a desired new width and height, carve (or grow) the image
    /// to that size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), ConfigError> {
        match self.resize_with_progress(width, height, &mut NoProgress) {
            Ok(()) => Ok(()),
            Err(CarveError::Config(err)) => Err(err),
            Err(CarveError::Cancelled) => unreachable!("resize cancelled without a reporter"),
        }
    }

    /// `resize`, reporting once per seam ranked.
    ///
    /// A cancelled resize leaves the image and its dimensions as they
    /// were, but not the visibility maps: seams ranked before the
    /// cancellation keep their ranks, so `visibility_map().depth()` may
    /// have grown, and colours blended for growth stay recorded.  The
    /// next resize picks up from there and gives the same image a fresh
    /// carver would.
    pub fn resize_with_progress(
        &mut self,
        width: u32,
        height: u32,
        progress: &mut dyn Progress,
    ) -> Result<(), CarveError> {
        self.check_target(width, height)?;

        let first = self.primary.orientation();
        let second = first.turn();
        let first_size = first.along((width, height));
        let second_size = second.along((width, height));
        let first_depth = distance(self.primary.width(), first_size);
        let second_depth = distance(second.along(self.original_dimensions()), second_size);

        let reusable = self
            .secondary
            .as_ref()
            .filter(|stage| stage.size == first_size);
        let pending = first_depth.saturating_sub(self.primary.depth())
            + reusable.map_or(second_depth, |stage| {
                second_depth.saturating_sub(stage.vmap.depth())
            });
        debug!(
            width,
            height,
            pending,
            reuse = reusable.is_some(),
            "resizing"
        );

        let mut ticker = Ticker::new(progress, pending);
        self.primary.extend_to(
            &self.original,
            &self.palette,
            &self.function,
            self.config.rigidity,
            first_depth,
            &mut ticker,
        )?;

        let mut fresh: Option<Stage> = None;
        let stage = match self.secondary.as_mut() {
            Some(stage) if stage.size == first_size => stage,
            _ => {
                let base = self
                    .primary
                    .materialize(&self.original, &mut self.palette, first_size);
                let vmap = VisibilityMap::new(&base, second);
                fresh.insert(Stage {
                    size: first_size,
                    base,
                    vmap,
                })
            }
        };
        stage.vmap.extend_to(
            &stage.base,
            &self.palette,
            &self.function,
            self.config.rigidity,
            second_depth,
            &mut ticker,
        )?;
        let result = stage
            .vmap
            .materialize(&stage.base, &mut self.palette, second_size);

        self.current = result;
        if let Some(stage) = fresh {
            self.secondary = Some(stage);
        }
        ticker.finish();
        debug!(width, height, "resized");
        Ok(())
    }

    /// The rank map of the first dimension carved, over the original
    /// image.
    pub fn visibility_map(&self) -> &VisibilityMap {
        &self.primary
    }

    /// The rank map of the second dimension, over the first
    /// dimension's result, if one has been started.
    pub fn secondary_visibility_map(&self) -> Option<&VisibilityMap> {
        self.secondary.as_ref().map(|stage| &stage.vmap)
    }

    /// The energy of every pixel of the current image.
    pub fn energy_map(&self) -> TwoDimensionalMap<f64> {
        let view = Flipper::new(&self.current, Orientation::Width);
        unflip(
            &calculate_energy(&self.function, &self.palette, &view),
            Orientation::Width,
        )
    }

    /// The current image as an 8-bit interleaved buffer.
    pub fn to_raw(&self) -> RawImage {
        self.current.to_raw(&self.palette, self.image_type)
    }

    /// The current image as an `image` buffer with the same number of
    /// channels.
    pub fn to_image<P>(&self) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, ConfigError>
    where
        P: Pixel + 'static,
    {
        if <usize as From<u8>>::from(P::CHANNEL_COUNT) != self.palette.channels() {
            return Err(ConfigError::Channels(format!(
                "cannot read {} channels into a {} pixel",
                self.palette.channels(),
                P::COLOR_MODEL
            )));
        }
        let max = <f64 as NumCast>::from(<P::Subpixel as Primitive>::DEFAULT_MAX_VALUE).unwrap_or(1.0);
        // Integer subpixels round; floating-point ones don't.
        let integral = max > 1.0;
        let (width, height) = self.dimensions();
        let mut out = ImageBuffer::<P, Vec<P::Subpixel>>::new(width, height);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let id = self.current.pixels[(x, y)];
            for (dst, v) in pixel.channels_mut().iter_mut().zip(self.palette.color(id)) {
                let scaled = (v * max).max(0.0).min(max);
                let scaled = cq!(integral, scaled.round(), scaled);
                *dst = NumCast::from(scaled).unwrap_or(<P::Subpixel as Primitive>::DEFAULT_MIN_VALUE);
            }
        }
        Ok(out)
    }
}
