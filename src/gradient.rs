// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gradient functions: how the two partial derivatives of a pixel are
//! folded into one energy value.

use crate::errors::ConfigError;
use std::str::FromStr;

pub type GradFn = fn(f64, f64) -> f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientType {
    /// Euclidean norm.
    Norm,
    /// Manhattan norm.
    SumAbs,
    /// Magnitude of the across-seam derivative only.
    XAbs,
    /// Always zero.
    Null,
}

impl GradientType {
    pub fn resolve(self) -> GradFn {
        match self {
            GradientType::Norm => grad_norm,
            GradientType::SumAbs => grad_sumabs,
            GradientType::XAbs => grad_xabs,
            GradientType::Null => grad_null,
        }
    }
}

impl FromStr for GradientType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "norm" => Ok(GradientType::Norm),
            "sumabs" => Ok(GradientType::SumAbs),
            "xabs" => Ok(GradientType::XAbs),
            "null" => Ok(GradientType::Null),
            _ => Err(ConfigError::Setting(format!("unknown gradient '{}'", s))),
        }
    }
}

pub fn grad_norm(gx: f64, gy: f64) -> f64 {
    gx.hypot(gy)
}

pub fn grad_sumabs(gx: f64, gy: f64) -> f64 {
    gx.abs() + gy.abs()
}

pub fn grad_xabs(gx: f64, _gy: f64) -> f64 {
    gx.abs()
}

pub fn grad_null(_gx: f64, _gy: f64) -> f64 {
    0.0
}
