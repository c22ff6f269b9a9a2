// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware image resizing by seam carving.
//!
//! ```no_run
//! use liquidseam::{RawImage, SeamCarver};
//!
//! let raw = RawImage::new(4, 1, 1, None, vec![0, 10, 200, 40]).unwrap();
//! let mut carver = SeamCarver::new(raw).unwrap();
//! carver.resize(3, 1).unwrap();
//! assert_eq!(carver.to_raw().data.len(), 3);
//! ```

// #![deny(missing_docs)]

mod ternary;

pub mod config;
pub mod dump;
pub mod energy;
pub mod errors;
pub mod flipper;
pub mod gradient;
pub mod pixelpairs;
pub mod pixels;
pub mod progress;
pub mod reader;
pub mod seamcarver;
pub mod seamfinder;
pub mod twodmap;
pub mod vmap;

pub use config::{CarverConfig, EnergySettings, ResizeOrder};
pub use energy::EnergyType;
pub use errors::{CarveError, ConfigError};
pub use flipper::Orientation;
pub use gradient::GradientType;
pub use pixels::{ImageType, RawImage};
pub use progress::{NoProgress, Progress};
pub use reader::ReaderType;
pub use seamcarver::SeamCarver;
pub use seamfinder::{energy_to_seam, seam_is_valid};
pub use twodmap::TwoDimensionalMap;
pub use vmap::VisibilityMap;
