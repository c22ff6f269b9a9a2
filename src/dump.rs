// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Pictures of the carver's internals, for looking at while tuning.

use crate::flipper::unflip;
use crate::twodmap::TwoDimensionalMap;
use crate::vmap::VisibilityMap;
use image::{GrayImage, ImageBuffer, Luma};
use itertools::{iproduct, Itertools, MinMaxResult};

/// Render an energy map as greys, stretched so the lowest energy is
/// black and the highest white.  A flat map is all black.
pub fn energy_to_image(energy: &TwoDimensionalMap<f64>) -> GrayImage {
    let (low, high) = match energy.as_slice().iter().minmax() {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(e) => (*e, *e),
        MinMaxResult::MinMax(low, high) => (*low, *high),
    };
    let span = high - low;

    let mut out: GrayImage = ImageBuffer::new(energy.width, energy.height);
    for (y, x) in iproduct!(0..energy.height, 0..energy.width) {
        let e = energy[(x, y)];
        let level = if span > 0.0 { (e - low) / span * 255.0 } else { 0.0 };
        out.put_pixel(x, y, Luma([level.round() as u8]));
    }
    out
}

/// Render a visibility map in image coordinates.  Pixels removed first
/// are black, later ones lighter, and pixels no seam has taken white.
pub fn visibility_to_image(vmap: &VisibilityMap) -> GrayImage {
    let depth = vmap.depth().max(1);
    let ranks: Vec<Vec<u32>> = vmap.ranks().rows().map(|row| row.to_vec()).collect();
    let ranks = unflip(&ranks, vmap.orientation());

    ImageBuffer::from_fn(ranks.width, ranks.height, |x, y| match ranks[(x, y)] {
        0 => Luma([255]),
        rank => Luma([((rank - 1) * 254 / depth) as u8]),
    })
}
