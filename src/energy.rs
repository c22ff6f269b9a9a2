// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! The energy of a pixel is how much it would hurt to lose it.  It is
//! put together from three choices: an energy function that decides
//! what gets differentiated, a reader that turns a pixel into a scalar,
//! and a gradient that folds the two partial derivatives into one
//! number.  `EnergyFunction::bind` resolves the three into function
//! pointers once, so the inner loop never matches on an enum.
//!
//! Derivatives are central differences in the interior and one-sided
//! differences on the border.  A pixel outside the grid is never read;
//! along an axis only one pixel long the derivative is zero.

use crate::config::EnergySettings;
use crate::cq;
use crate::errors::ConfigError;
use crate::flipper::Flipper;
use crate::gradient::GradFn;
use crate::pixelpairs::{brightness_of_pair, luma_of_pair, PixelPair};
use crate::pixels::{ImageType, Palette};
use crate::reader::{read_brightness, read_lightness, read_luma, ReadFn, ReaderType};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyType {
    /// Finite differences of the reader's scalar.
    Standard,
    /// Finite differences taken channel by channel on absolute values.
    Absolute,
    /// Zero everywhere.
    Null,
}

impl FromStr for EnergyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "std" | "standard" => Ok(EnergyType::Standard),
            "abs" | "absolute" => Ok(EnergyType::Absolute),
            "null" => Ok(EnergyType::Null),
            _ => Err(ConfigError::Setting(format!("unknown energy function '{}'", s))),
        }
    }
}

/// Anything the energy can be evaluated over: a logical grid of
/// palette indices.
pub trait PixelGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> u32;
}

impl<'a> PixelGrid for Flipper<'a> {
    fn width(&self) -> u32 {
        Flipper::width(self)
    }

    fn height(&self) -> u32 {
        Flipper::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        Flipper::pixel(self, x, y)
    }
}

#[derive(Clone, Copy)]
enum Probe {
    Scalar(ReadFn),
    Pair(PixelPair),
    Null,
}

/// A resolved (energy, gradient, reader) triple.
#[derive(Clone, Copy)]
pub struct EnergyFunction {
    settings: EnergySettings,
    probe: Probe,
    gradient: GradFn,
}

impl fmt::Debug for EnergyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyFunction")
            .field("settings", &self.settings)
            .finish()
    }
}

impl EnergyFunction {
    /// Resolve a selection for an image type.  Nothing is bound unless
    /// the whole selection is valid.
    pub fn bind(settings: EnergySettings, image_type: ImageType) -> Result<Self, ConfigError> {
        let reader = match settings.reader {
            ReaderType::Luma if !image_type.has_rgb() => {
                if settings.energy != EnergyType::Null {
                    warn!(?image_type, "luma needs rgb channels, reading brightness");
                }
                ReaderType::Brightness
            }
            reader => reader,
        };

        let probe = match settings.energy {
            EnergyType::Null => Probe::Null,
            EnergyType::Standard => Probe::Scalar(match reader {
                ReaderType::Brightness => read_brightness,
                ReaderType::Luma => read_luma,
                ReaderType::Lightness => read_lightness,
            }),
            EnergyType::Absolute => Probe::Pair(match reader {
                ReaderType::Brightness => brightness_of_pair,
                ReaderType::Luma => luma_of_pair,
                ReaderType::Lightness => {
                    return Err(ConfigError::IncompatibleReader {
                        energy: settings.energy,
                        reader: settings.reader,
                    })
                }
            }),
        };

        Ok(EnergyFunction {
            settings,
            probe,
            gradient: settings.gradient.resolve(),
        })
    }

    /// The selection this function was bound from.
    pub fn settings(&self) -> EnergySettings {
        self.settings
    }

    // The signed (or, for the absolute energy, unsigned) difference
    // between two pixels.
    fn difference<G: PixelGrid>(
        &self,
        palette: &Palette,
        grid: &G,
        (x1, y1): (u32, u32),
        (x2, y2): (u32, u32),
    ) -> f64 {
        match self.probe {
            Probe::Scalar(read) => {
                read(palette, grid.pixel(x1, y1)) - read(palette, grid.pixel(x2, y2))
            }
            Probe::Pair(pair) => pair(palette, grid.pixel(x1, y1), grid.pixel(x2, y2)),
            Probe::Null => 0.0,
        }
    }

    /// Energy of the pixel at logical `(x, y)`.
    pub fn energy_at<G: PixelGrid>(&self, palette: &Palette, grid: &G, x: u32, y: u32) -> f64 {
        if let Probe::Null = self.probe {
            return 0.0;
        }
        let (w, h) = (grid.width(), grid.height());
        let d = |a, b| self.difference(palette, grid, a, b);

        let gx = cq!(w < 2, 0.0,
                 cq!(x == 0, d((x + 1, y), (x, y)),
                 cq!(x < w - 1, d((x + 1, y), (x - 1, y)) / 2.0,
                     d((x, y), (x - 1, y)))));

        let gy = cq!(h < 2, 0.0,
                 cq!(y == 0, d((x, y + 1), (x, y)),
                 cq!(y < h - 1, d((x, y + 1), (x, y - 1)) / 2.0,
                     d((x, y), (x, y - 1)))));

        (self.gradient)(gx, gy)
    }

    pub(crate) fn fill_row<G: PixelGrid>(&self, palette: &Palette, grid: &G, y: u32, row: &mut [f64]) {
        for (x, e) in row.iter_mut().enumerate() {
            *e = self.energy_at(palette, grid, x as u32, y);
        }
    }
}

/// Compute the energy of every pixel of a grid, one `Vec` per logical
/// row.
#[cfg(not(feature = "threaded"))]
pub fn calculate_energy<G>(function: &EnergyFunction, palette: &Palette, grid: &G) -> Vec<Vec<f64>>
where
    G: PixelGrid + Sync,
{
    let (width, height) = (grid.width(), grid.height());
    let mut rows = vec![vec![0.0; width as usize]; height as usize];
    for (y, row) in rows.iter_mut().enumerate() {
        function.fill_row(palette, grid, y as u32, row);
    }
    rows
}

// Every pixel's energy is independent of every other's, so the rows
// are broken up with chunks_mut into one band per CPU and each band is
// filled in its own scoped thread.

/// Compute the energy of every pixel of a grid, one `Vec` per logical
/// row.
#[cfg(feature = "threaded")]
pub fn calculate_energy<G>(function: &EnergyFunction, palette: &Palette, grid: &G) -> Vec<Vec<f64>>
where
    G: PixelGrid + Sync,
{
    let (width, height) = (grid.width(), grid.height());
    let mut rows = vec![vec![0.0; width as usize]; height as usize];
    let cpus = num_cpus::get().max(1);
    let band = ((height as usize + cpus - 1) / cpus).max(1);

    let outcome = crossbeam::scope(|scope| {
        for (i, chunk) in rows.chunks_mut(band).enumerate() {
            scope.spawn(move |_| {
                for (j, row) in chunk.iter_mut().enumerate() {
                    function.fill_row(palette, grid, (i * band + j) as u32, row);
                }
            });
        }
    });
    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flipper::Orientation;
    use crate::gradient::GradientType;
    use crate::pixels::Canvas;
    use crate::twodmap::TwoDimensionalMap;

    fn grey(width: u32, height: u32, values: &[f64]) -> (Palette, Canvas) {
        let mut palette = Palette::new(1, None);
        let ids = values.iter().map(|v| palette.intern(&[*v])).collect();
        let canvas = Canvas {
            pixels: TwoDimensionalMap::from_vec(width, height, ids).unwrap(),
            rigidity: None,
        };
        (palette, canvas)
    }

    fn settings(energy: EnergyType, gradient: GradientType, reader: ReaderType) -> EnergySettings {
        EnergySettings {
            energy,
            gradient,
            reader,
        }
    }

    const IMAGE_DATA: [f64; 9] = [0.0, 0.5, 1.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];
    const IMAGE_ENERGY: [f64; 9] = [0.5, 0.5, 0.5, 1.0, 0.75, 0.5, 1.0, 0.5, 0.0];

    #[test]
    fn energy_generator_works() {
        let (palette, canvas) = grey(3, 3, &IMAGE_DATA);
        let function = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::SumAbs, ReaderType::Brightness),
            ImageType::Grey,
        )
        .unwrap();
        let view = Flipper::new(&canvas, Orientation::Width);
        let energy: Vec<f64> = calculate_energy(&function, &palette, &view)
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(energy, IMAGE_ENERGY);
    }

    #[test]
    fn transposed_energy_swaps_the_derivatives() {
        let (palette, canvas) = grey(3, 3, &IMAGE_DATA);
        let function = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::XAbs, ReaderType::Brightness),
            ImageType::Grey,
        )
        .unwrap();
        let view = Flipper::new(&canvas, Orientation::Height);
        // Across-seam in the flipped view is down the canvas' column.
        assert_eq!(function.energy_at(&palette, &view, 1, 0), 0.5);
        assert_eq!(function.energy_at(&palette, &view, 2, 2), 0.0);
    }

    #[test]
    fn single_row_images_have_no_vertical_derivative() {
        let (palette, canvas) = grey(3, 1, &[0.0, 0.25, 1.0]);
        let function = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::Norm, ReaderType::Brightness),
            ImageType::Grey,
        )
        .unwrap();
        let view = Flipper::new(&canvas, Orientation::Width);
        let energy = calculate_energy(&function, &palette, &view);
        assert_eq!(energy, vec![vec![0.25, 0.5, 0.75]]);
    }

    #[test]
    fn absolute_energy_sees_through_cancellation() {
        let mut palette = Palette::new(3, None);
        let ids = vec![
            palette.intern(&[1.0, 0.0, 0.5]),
            palette.intern(&[0.0, 1.0, 0.5]),
        ];
        let canvas = Canvas {
            pixels: TwoDimensionalMap::from_vec(2, 1, ids).unwrap(),
            rigidity: None,
        };
        let view = Flipper::new(&canvas, Orientation::Width);

        let standard = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::XAbs, ReaderType::Brightness),
            ImageType::Rgb,
        )
        .unwrap();
        assert_eq!(standard.energy_at(&palette, &view, 0, 0), 0.0);

        let absolute = EnergyFunction::bind(
            settings(EnergyType::Absolute, GradientType::XAbs, ReaderType::Brightness),
            ImageType::Rgb,
        )
        .unwrap();
        assert!((absolute.energy_at(&palette, &view, 0, 0) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn luma_falls_back_to_brightness_without_rgb() {
        let mut palette = Palette::new(2, Some(1));
        let ids = vec![
            palette.intern(&[0.2, 1.0]),
            palette.intern(&[0.8, 0.5]),
            palette.intern(&[0.4, 1.0]),
        ];
        let canvas = Canvas {
            pixels: TwoDimensionalMap::from_vec(3, 1, ids).unwrap(),
            rigidity: None,
        };
        let view = Flipper::new(&canvas, Orientation::Width);

        let luma = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::Norm, ReaderType::Luma),
            ImageType::GreyA,
        )
        .unwrap();
        let brightness = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::Norm, ReaderType::Brightness),
            ImageType::GreyA,
        )
        .unwrap();
        assert_eq!(
            calculate_energy(&luma, &palette, &view),
            calculate_energy(&brightness, &palette, &view)
        );
    }

    #[test]
    fn lightness_has_no_absolute_form() {
        let err = EnergyFunction::bind(
            settings(EnergyType::Absolute, GradientType::Norm, ReaderType::Lightness),
            ImageType::Rgb,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::IncompatibleReader {
                energy: EnergyType::Absolute,
                reader: ReaderType::Lightness
            }
        );
        // The null energy reads nothing, so any reader will do.
        assert!(EnergyFunction::bind(
            settings(EnergyType::Null, GradientType::Norm, ReaderType::Lightness),
            ImageType::Rgb,
        )
        .is_ok());
    }

    #[test]
    fn null_gradient_binds_and_flattens_the_field() {
        let (palette, canvas) = grey(3, 3, &IMAGE_DATA);
        let function = EnergyFunction::bind(
            settings(EnergyType::Standard, GradientType::Null, ReaderType::Brightness),
            ImageType::Grey,
        )
        .unwrap();
        let view = Flipper::new(&canvas, Orientation::Width);
        let energy = calculate_energy(&function, &palette, &view);
        assert!(energy.iter().flatten().all(|e| *e == 0.0));
    }
}
