// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image dimensional flipper
//!
//! A proxy over a `Canvas` that, when flipped, maps the width to the
//! original height and vice versa, as well as every x to y.
//!
//! Every algorithm downstream of this (energy, seam finding, the
//! visibility map) is written for one case only: a seam that runs
//! top-to-bottom, one pixel per row, and shrinks the width.  Carving
//! the height is the same thing done through a flipped view.  Turning
//! the view is a flag flip; nothing is copied.

use crate::pixels::Canvas;
use crate::twodmap::TwoDimensionalMap;

/// Which image dimension a pass of seams changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Seams run top-to-bottom and change the width.
    Width,
    /// Seams run left-to-right and change the height.
    Height,
}

impl Orientation {
    pub fn turn(self) -> Self {
        match self {
            Orientation::Width => Orientation::Height,
            Orientation::Height => Orientation::Width,
        }
    }

    pub fn is_transposed(self) -> bool {
        self == Orientation::Height
    }

    /// The size along this orientation's axis.
    pub fn along(self, (width, height): (u32, u32)) -> u32 {
        if self.is_transposed() {
            height
        } else {
            width
        }
    }
}

/// A read-only, possibly transposed view of a canvas.  Coordinates
/// handed to it are always logical: `x` along the carved axis, `y`
/// along the seam.
#[derive(Debug, Clone, Copy)]
pub struct Flipper<'a> {
    canvas: &'a Canvas,
    transposed: bool,
}

impl<'a> Flipper<'a> {
    pub fn new(canvas: &'a Canvas, orientation: Orientation) -> Self {
        Flipper {
            canvas,
            transposed: orientation.is_transposed(),
        }
    }

    pub fn turn(&mut self) {
        self.transposed = !self.transposed;
    }

    pub fn orientation(&self) -> Orientation {
        if self.transposed {
            Orientation::Height
        } else {
            Orientation::Width
        }
    }

    // The one place logical coordinates become storage coordinates.
    fn locate(&self, x: u32, y: u32) -> (u32, u32) {
        if self.transposed {
            (y, x)
        } else {
            (x, y)
        }
    }

    pub fn width(&self) -> u32 {
        if self.transposed {
            self.canvas.height()
        } else {
            self.canvas.width()
        }
    }

    pub fn height(&self) -> u32 {
        if self.transposed {
            self.canvas.width()
        } else {
            self.canvas.height()
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.canvas.pixels[self.locate(x, y)]
    }

    /// The rigidity mask value, or `None` when no mask is set.
    pub fn rigidity(&self, x: u32, y: u32) -> Option<f64> {
        let at = self.locate(x, y);
        self.canvas.rigidity.as_ref().map(|mask| mask[at])
    }

    pub fn has_rigidity(&self) -> bool {
        self.canvas.rigidity.is_some()
    }
}

/// Lay logical rows (all the same length) back out in storage order,
/// the inverse of reading them through a `Flipper`.
pub(crate) fn unflip<P: Default + Copy>(rows: &[Vec<P>], orientation: Orientation) -> TwoDimensionalMap<P> {
    let (width, height) = (rows.first().map_or(0, |r| r.len()) as u32, rows.len() as u32);
    let mut map = if orientation.is_transposed() {
        TwoDimensionalMap::new(height, width)
    } else {
        TwoDimensionalMap::new(width, height)
    };
    for (y, row) in rows.iter().enumerate() {
        for (x, p) in row.iter().enumerate() {
            let at = if orientation.is_transposed() {
                (y as u32, x as u32)
            } else {
                (x as u32, y as u32)
            };
            map[at] = *p;
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        // 3 wide, 2 high
        Canvas {
            pixels: TwoDimensionalMap::from_vec(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap(),
            rigidity: None,
        }
    }

    #[test]
    fn unflipped_view_is_the_canvas() {
        let c = canvas();
        let view = Flipper::new(&c, Orientation::Width);
        assert_eq!(view.dimensions(), (3, 2));
        assert_eq!(view.pixel(2, 1), 5);
    }

    #[test]
    fn flipped_view_swaps_axes() {
        let c = canvas();
        let mut view = Flipper::new(&c, Orientation::Width);
        view.turn();
        assert_eq!(view.orientation(), Orientation::Height);
        assert_eq!(view.dimensions(), (2, 3));
        // Logical row 2 is the canvas' third column.
        assert_eq!(view.pixel(0, 2), 2);
        assert_eq!(view.pixel(1, 2), 5);
        view.turn();
        assert_eq!(view.pixel(1, 0), 1);
    }

    #[test]
    fn unflip_inverts_the_view() {
        let c = canvas();
        for &orientation in &[Orientation::Width, Orientation::Height] {
            let view = Flipper::new(&c, orientation);
            let rows: Vec<Vec<u32>> = (0..view.height())
                .map(|y| (0..view.width()).map(|x| view.pixel(x, y)).collect())
                .collect();
            assert_eq!(unflip(&rows, orientation), c.pixels);
        }
    }

    #[test]
    fn orientation_turns() {
        assert_eq!(Orientation::Width.turn(), Orientation::Height);
        assert_eq!(Orientation::Height.turn().turn(), Orientation::Height);
        assert_eq!(Orientation::Height.along((7, 9)), 9);
    }
}
