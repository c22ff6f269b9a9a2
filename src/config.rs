// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Carver configuration.

use crate::energy::EnergyType;
use crate::errors::ConfigError;
use crate::flipper::Orientation;
use crate::gradient::GradientType;
use crate::reader::ReaderType;
use std::str::FromStr;

/// The (energy, gradient, reader) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergySettings {
    pub energy: EnergyType,
    pub gradient: GradientType,
    pub reader: ReaderType,
}

impl Default for EnergySettings {
    fn default() -> Self {
        EnergySettings {
            energy: EnergyType::Standard,
            gradient: GradientType::XAbs,
            reader: ReaderType::Brightness,
        }
    }
}

impl EnergySettings {
    pub fn new(energy: EnergyType, gradient: GradientType, reader: ReaderType) -> Self {
        EnergySettings {
            energy,
            gradient,
            reader,
        }
    }
}

/// Which dimension is carved first.  The first is carved over the
/// original image, the second over the result of the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOrder {
    WidthFirst,
    HeightFirst,
}

impl ResizeOrder {
    pub fn first(self) -> Orientation {
        match self {
            ResizeOrder::WidthFirst => Orientation::Width,
            ResizeOrder::HeightFirst => Orientation::Height,
        }
    }
}

impl Default for ResizeOrder {
    fn default() -> Self {
        ResizeOrder::WidthFirst
    }
}

impl FromStr for ResizeOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "width" | "hor" | "horizontal" => Ok(ResizeOrder::WidthFirst),
            "height" | "vert" | "vertical" => Ok(ResizeOrder::HeightFirst),
            _ => Err(ConfigError::Setting(format!("unknown resize order '{}'", s))),
        }
    }
}

/// Largest rigidity coefficient accepted.  Seam costs summed over any
/// image height stay finite below it.
pub const MAX_RIGIDITY: f64 = 1e9;

/// Everything a `SeamCarver` can be tuned with.
#[derive(Debug, Clone, PartialEq)]
pub struct CarverConfig {
    pub energy: EnergySettings,
    pub resize_order: ResizeOrder,
    /// Extra cost per column a seam steps sideways, scaled by the
    /// rigidity mask where one is set.
    pub rigidity: f64,
    pub min_width: u32,
    pub min_height: u32,
    /// How far an image may grow, as a multiple of its original size.
    pub max_enlargement: f64,
}

impl Default for CarverConfig {
    fn default() -> Self {
        CarverConfig {
            energy: EnergySettings::default(),
            resize_order: ResizeOrder::default(),
            rigidity: 0.0,
            min_width: 1,
            min_height: 1,
            max_enlargement: 2.0,
        }
    }
}

impl CarverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_energy(mut self, energy: EnergySettings) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_resize_order(mut self, order: ResizeOrder) -> Self {
        self.resize_order = order;
        self
    }

    pub fn with_rigidity(mut self, rigidity: f64) -> Self {
        self.rigidity = rigidity;
        self
    }

    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    pub fn with_max_enlargement(mut self, factor: f64) -> Self {
        self.max_enlargement = factor;
        self
    }

    /// Check the numeric settings.  The energy selection is checked
    /// separately, against the image it will read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=MAX_RIGIDITY).contains(&self.rigidity) {
            return Err(ConfigError::Setting(format!(
                "rigidity must be between 0 and {}, got {}",
                MAX_RIGIDITY, self.rigidity
            )));
        }
        if self.min_width == 0 || self.min_height == 0 {
            return Err(ConfigError::Setting("minimum size must be at least 1x1".into()));
        }
        if !self.max_enlargement.is_finite() || self.max_enlargement < 1.0 {
            return Err(ConfigError::Setting(format!(
                "enlargement factor must be at least 1, got {}",
                self.max_enlargement
            )));
        }
        Ok(())
    }

    /// The largest size an axis `original` pixels long may grow to.
    /// One pass inserts at most one pixel per removable seam.
    pub(crate) fn max_size(&self, original: u32) -> u32 {
        let by_factor = (f64::from(original) * self.max_enlargement).floor() as u32;
        by_factor.min(original.saturating_mul(2).saturating_sub(1)).max(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(CarverConfig::default().validate().is_ok());
        assert_eq!(CarverConfig::new().resize_order.first(), Orientation::Width);
    }

    #[test]
    fn bad_numbers_are_refused() {
        assert!(CarverConfig::new().with_rigidity(-1.0).validate().is_err());
        assert!(CarverConfig::new().with_rigidity(f64::NAN).validate().is_err());
        assert!(CarverConfig::new().with_rigidity(f64::MAX).validate().is_err());
        assert!(CarverConfig::new().with_rigidity(MAX_RIGIDITY).validate().is_ok());
        assert!(CarverConfig::new().with_min_size(0, 4).validate().is_err());
        assert!(CarverConfig::new().with_max_enlargement(0.5).validate().is_err());
    }

    #[test]
    fn growth_is_bounded_by_the_removable_seams() {
        let config = CarverConfig::new();
        assert_eq!(config.max_size(10), 19);
        assert_eq!(config.max_size(1), 1);
        let config = config.with_max_enlargement(1.5);
        assert_eq!(config.max_size(10), 15);
        assert_eq!(config.with_max_enlargement(1.0).max_size(10), 10);
    }

    #[test]
    fn orders_parse_by_name() {
        assert_eq!("height".parse::<ResizeOrder>(), Ok(ResizeOrder::HeightFirst));
        assert!("diagonal".parse::<ResizeOrder>().is_err());
    }
}
