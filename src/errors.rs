// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors reported by the carver.
//!
//! Only configuration mistakes are recoverable.  Anything that goes
//! wrong inside the energy field, the seam finder or the visibility
//! map is a bug in this crate and panics instead.

use crate::energy::EnergyType;
use crate::reader::ReaderType;
use failure::Fail;

/// A rejected setting, target size, or input buffer.  A carver that
/// hands one of these back is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum ConfigError {
    #[fail(
        display = "the {:?} reader cannot be combined with {:?} energy",
        reader, energy
    )]
    IncompatibleReader {
        energy: EnergyType,
        reader: ReaderType,
    },

    #[fail(
        display = "cannot resize to {}x{}: allowed range is {}x{} to {}x{}",
        width, height, min_width, min_height, max_width, max_height
    )]
    TargetSize {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[fail(
        display = "rigidity mask is {}x{} but the image is {}x{}",
        mask_width, mask_height, width, height
    )]
    MaskDimensions {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },

    #[fail(display = "rigidity mask value at ({}, {}) is outside [0, 1]", x, y)]
    MaskValue { x: u32, y: u32 },

    #[fail(
        display = "buffer holds {} bytes, expected {} for {}x{} with {} channels",
        actual, expected, width, height, channels
    )]
    BufferSize {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        channels: usize,
    },

    #[fail(display = "unsupported channel layout: {}", _0)]
    Channels(String),

    #[fail(display = "invalid setting: {}", _0)]
    Setting(String),
}

/// Everything `resize_with_progress` can fail with.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum CarveError {
    #[fail(display = "{}", _0)]
    Config(#[fail(cause)] ConfigError),

    #[fail(display = "resize was cancelled")]
    Cancelled,
}

impl From<ConfigError> for CarveError {
    fn from(err: ConfigError) -> Self {
        CarveError::Config(err)
    }
}
