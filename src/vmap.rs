// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The visibility map
//!
//! Carving an image one seam at a time is expensive; carving it again
//! for a slightly different size shouldn't be.  The visibility map
//! records, for every pixel of a base image, the rank of the seam that
//! removed it (1 for the first seam, 2 for the second, and so on; 0
//! for a pixel no seam has taken yet).  Once `depth` seams are ranked,
//! the image at any width from `width - depth` up to `width + depth`
//! can be read straight off the ranks:
//!
//!  * shrinking by `k` keeps every pixel whose rank is 0 or above `k`;
//!  * growing by `k` keeps every pixel, and after each pixel ranked
//!    `1..=k` inserts a new one blended from its neighbours.
//!
//! Ranks are permanent.  Extending the map only ever ranks pixels that
//! are still unranked, so the answer for a size computed early is the
//! same answer it gives after any number of later extensions.
//!
//! The map works on logical coordinates through a `Flipper`, so a map
//! with `Orientation::Height` ranks horizontal seams with exactly the
//! same code.

use crate::cq;
use crate::energy::{calculate_energy, EnergyFunction, PixelGrid};
use crate::errors::CarveError;
use crate::flipper::{unflip, Flipper, Orientation};
use crate::pixels::{Canvas, Palette};
use crate::progress::Ticker;
use crate::seamfinder::{energy_to_seam, seam_is_valid};
use crate::twodmap::TwoDimensionalMap;
use tracing::trace;

// The base image as it stands after `depth` seams: each live row lists
// the base x coordinates still present, in order.
struct LiveView<'a> {
    base: Flipper<'a>,
    live: &'a [Vec<u32>],
}

impl<'a> PixelGrid for LiveView<'a> {
    fn width(&self) -> u32 {
        self.live.first().map_or(0, |row| row.len()) as u32
    }

    fn height(&self) -> u32 {
        self.live.len() as u32
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.base.pixel(self.live[y as usize][x as usize], y)
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityMap {
    orientation: Orientation,
    width: u32,
    height: u32,
    ranks: TwoDimensionalMap<u32>,
    depth: u32,
    live: Vec<Vec<u32>>,
    // Energy of the live pixels, computed on the first extension and
    // patched around every seam after that.
    energy: Option<Vec<Vec<f64>>>,
    rigidity: Option<Vec<Vec<f64>>>,
}

impl VisibilityMap {
    /// An empty map over `base`, ranking seams that shrink the axis
    /// `orientation` names.
    pub fn new(base: &Canvas, orientation: Orientation) -> Self {
        let view = Flipper::new(base, orientation);
        let (width, height) = view.dimensions();
        let live = (0..height).map(|_| (0..width).collect()).collect();
        let rigidity = if view.has_rigidity() {
            Some(
                (0..height)
                    .map(|y| {
                        (0..width)
                            .map(|x| view.rigidity(x, y).unwrap_or(0.0))
                            .collect()
                    })
                    .collect(),
            )
        } else {
            None
        };
        VisibilityMap {
            orientation,
            width,
            height,
            ranks: TwoDimensionalMap::new(width, height),
            depth: 0,
            live,
            energy: None,
            rigidity,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Logical width of the base: the size of the carved axis.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height of the base: the length of every seam.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// How many seams have been ranked.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The most seams the base can give up; one pixel per row always
    /// remains.
    pub fn max_depth(&self) -> u32 {
        self.width.saturating_sub(1)
    }

    /// Rank of the pixel at logical `(x, y)`, 0 if it hasn't been
    /// removed.
    pub fn rank(&self, x: u32, y: u32) -> u32 {
        self.ranks[(x, y)]
    }

    /// The rank of every base pixel, in logical coordinates.
    pub fn ranks(&self) -> &TwoDimensionalMap<u32> {
        &self.ranks
    }

    /// The base x coordinates of the seam ranked `rank`, one per row.
    pub fn seam(&self, rank: u32) -> Option<Vec<u32>> {
        if rank == 0 || rank > self.depth {
            return None;
        }
        (0..self.height)
            .map(|y| self.ranks.row(y).iter().position(|&r| r == rank).map(|x| x as u32))
            .collect()
    }

    /// Rank seams until `depth` of them exist.  Asking for fewer than
    /// are already ranked does nothing.  A cancelled extension keeps
    /// the seams ranked so far.
    pub(crate) fn extend_to(
        &mut self,
        base: &Canvas,
        palette: &Palette,
        function: &EnergyFunction,
        rigidity: f64,
        depth: u32,
        ticker: &mut Ticker<'_>,
    ) -> Result<(), CarveError> {
        assert!(
            depth <= self.max_depth(),
            "{} seams requested from a base {} wide",
            depth,
            self.width
        );
        if depth <= self.depth {
            return Ok(());
        }

        let view = Flipper::new(base, self.orientation);
        assert_eq!(view.dimensions(), (self.width, self.height), "visibility map base changed");

        let mut energy = match self.energy.take() {
            Some(energy) => energy,
            None => calculate_energy(function, palette, &LiveView {
                base: view,
                live: &self.live,
            }),
        };

        let outcome = loop {
            if self.depth >= depth {
                break Ok(());
            }
            let seam = energy_to_seam(&energy, self.rigidity.as_deref(), rigidity);
            assert!(
                seam_is_valid(&seam, self.width - self.depth, self.height),
                "malformed seam {:?}",
                seam
            );

            self.depth += 1;
            for (y, &x) in seam.iter().enumerate() {
                let x = x as usize;
                let base_x = self.live[y].remove(x);
                let rank = &mut self.ranks[(base_x, y as u32)];
                assert_eq!(*rank, 0, "pixel ({}, {}) ranked twice", base_x, y);
                *rank = self.depth;
                energy[y].remove(x);
                if let Some(mask) = self.rigidity.as_mut() {
                    mask[y].remove(x);
                }
            }

            let grid = LiveView {
                base: view,
                live: &self.live,
            };
            refresh_energy(&mut energy, &grid, palette, function, &seam);
            trace!(depth = self.depth, orientation = ?self.orientation, "seam ranked");

            if let Err(err) = ticker.tick() {
                break Err(err);
            }
        };

        self.energy = Some(energy);
        outcome
    }

    /// Rebuild the base at `size` along the carved axis.  Needs
    /// `|width - size|` seams ranked.
    pub(crate) fn materialize(&self, base: &Canvas, palette: &mut Palette, size: u32) -> Canvas {
        let view = Flipper::new(base, self.orientation);
        let needed = cq!(size <= self.width, self.width - size, size - self.width);
        assert!(
            needed <= self.depth,
            "size {} needs {} seams, only {} ranked",
            size,
            needed,
            self.depth
        );

        let mut pixels: Vec<Vec<u32>> = Vec::with_capacity(self.height as usize);
        let mut mask: Option<Vec<Vec<f64>>> = if view.has_rigidity() {
            Some(Vec::with_capacity(self.height as usize))
        } else {
            None
        };

        for y in 0..self.height {
            let mut row = Vec::with_capacity(size as usize);
            let mut mask_row = Vec::new();
            for x in 0..self.width {
                let rank = self.ranks[(x, y)];
                if size <= self.width {
                    if rank == 0 || rank > needed {
                        row.push(view.pixel(x, y));
                        mask_row.extend(view.rigidity(x, y));
                    }
                    continue;
                }
                row.push(view.pixel(x, y));
                mask_row.extend(view.rigidity(x, y));
                if rank != 0 && rank <= needed {
                    let left = cq!(x == 0, x, x - 1);
                    let right = cq!(x + 1 == self.width, x, x + 1);
                    row.push(palette.blend(view.pixel(left, y), view.pixel(right, y)));
                    mask_row.extend(view.rigidity(x, y));
                }
            }
            debug_assert_eq!(row.len(), size as usize);
            pixels.push(row);
            if let Some(mask) = mask.as_mut() {
                mask.push(mask_row);
            }
        }

        Canvas {
            pixels: unflip(&pixels, self.orientation),
            rigidity: mask.map(|m| unflip(&m, self.orientation)),
        }
    }
}

// Removing a seam changes the neighbours of the pixels beside it, and
// of the pixels above and below it wherever the seam moves sideways.
// Those, and only those, get their energy recomputed.
fn refresh_energy(
    energy: &mut [Vec<f64>],
    grid: &LiveView<'_>,
    palette: &Palette,
    function: &EnergyFunction,
    seam: &[u32],
) {
    let width = grid.width();
    if width == 0 {
        return;
    }
    let last = seam.len() - 1;
    for y in 0..seam.len() {
        let around = &seam[y.saturating_sub(1)..=(y + 1).min(last)];
        let lo = around.iter().copied().min().unwrap_or(seam[y]);
        let hi = around.iter().copied().max().unwrap_or(seam[y]);
        for x in lo.saturating_sub(1)..=hi.min(width - 1) {
            energy[y][x as usize] = function.energy_at(palette, grid, x, y as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergySettings;
    use crate::energy::EnergyType;
    use crate::gradient::GradientType;
    use crate::pixels::ImageType;
    use crate::progress::NoProgress;
    use crate::reader::ReaderType;

    // A reproducible noisy RGB canvas.
    fn noise(width: u32, height: u32, seed: u64) -> (Palette, Canvas) {
        let mut state = seed;
        let mut palette = Palette::new(3, None);
        let ids = (0..width * height)
            .map(|_| {
                let mut color = [0.0; 3];
                for c in color.iter_mut() {
                    state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1442695040888963407);
                    *c = f64::from((state >> 56) as u8) / 255.0;
                }
                palette.intern(&color)
            })
            .collect();
        let canvas = Canvas {
            pixels: TwoDimensionalMap::from_vec(width, height, ids).unwrap(),
            rigidity: None,
        };
        (palette, canvas)
    }

    fn function() -> EnergyFunction {
        EnergyFunction::bind(
            EnergySettings::new(EnergyType::Standard, GradientType::Norm, ReaderType::Luma),
            ImageType::Rgb,
        )
        .unwrap()
    }

    fn extend(vmap: &mut VisibilityMap, base: &Canvas, palette: &Palette, depth: u32) {
        let mut progress = NoProgress;
        let mut ticker = Ticker::new(&mut progress, depth);
        vmap.extend_to(base, palette, &function(), 0.0, depth, &mut ticker)
            .unwrap();
    }

    // The slow way: recompute everything, find a seam, cut it out.
    fn carve_from_scratch(base: &Canvas, palette: &Palette, seams: u32) -> Canvas {
        let f = function();
        let mut current = base.clone();
        for _ in 0..seams {
            let view = Flipper::new(&current, Orientation::Width);
            let energy = calculate_energy(&f, palette, &view);
            let seam = energy_to_seam(&energy, None, 0.0);
            let rows: Vec<Vec<u32>> = (0..view.height())
                .map(|y| {
                    (0..view.width())
                        .filter(|&x| x != seam[y as usize])
                        .map(|x| view.pixel(x, y))
                        .collect()
                })
                .collect();
            current = Canvas {
                pixels: unflip(&rows, Orientation::Width),
                rigidity: None,
            };
        }
        current
    }

    #[test]
    fn every_rank_takes_one_pixel_per_row() {
        let (palette, base) = noise(8, 5, 7);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 6);
        for row in vmap.ranks().rows() {
            let mut ranks: Vec<u32> = row.iter().copied().filter(|&r| r != 0).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
        }
    }

    #[test]
    fn ranks_are_permanent() {
        let (palette, base) = noise(9, 6, 11);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 3);
        let before = vmap.ranks().clone();

        extend(&mut vmap, &base, &palette, 2);
        assert_eq!(vmap.ranks(), &before);
        assert_eq!(vmap.depth(), 3);

        extend(&mut vmap, &base, &palette, 7);
        for (old, new) in before.as_slice().iter().zip(vmap.ranks().as_slice()) {
            if *old != 0 {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn patched_energy_matches_a_full_recompute() {
        let (palette, base) = noise(12, 7, 3);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 5);
        let fresh = calculate_energy(&function(), &palette, &LiveView {
            base: Flipper::new(&base, Orientation::Width),
            live: &vmap.live,
        });
        assert_eq!(vmap.energy.as_ref(), Some(&fresh));
    }

    #[test]
    fn shrinking_matches_carving_from_scratch() {
        let (mut palette, base) = noise(10, 6, 5);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 4);
        for k in 0..=4 {
            let expected = carve_from_scratch(&base, &palette, k);
            assert_eq!(vmap.materialize(&base, &mut palette, 10 - k), expected, "{} seams", k);
        }
    }

    #[test]
    fn materializing_the_base_width_is_the_identity() {
        let (mut palette, base) = noise(6, 4, 9);
        let mut vmap = VisibilityMap::new(&base, Orientation::Height);
        extend(&mut vmap, &base, &palette, 2);
        assert_eq!(vmap.materialize(&base, &mut palette, 4), base);
    }

    #[test]
    fn growing_inserts_blends_after_ranked_pixels() {
        let mut palette = Palette::new(1, None);
        let ids: Vec<u32> = [0.0, 0.2, 0.9, 0.4]
            .iter()
            .map(|v| palette.intern(&[*v]))
            .collect();
        let base = Canvas {
            pixels: TwoDimensionalMap::from_vec(4, 1, ids.clone()).unwrap(),
            rigidity: None,
        };
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 1);
        let seam = vmap.seam(1).unwrap();
        let x = seam[0] as usize;

        let grown = vmap.materialize(&base, &mut palette, 5);
        assert_eq!(grown.width(), 5);
        let row = grown.pixels.row(0);
        assert_eq!(&row[..=x], &ids[..=x]);
        assert_eq!(&row[x + 2..], &ids[x + 1..]);
        let left = ids[x.saturating_sub(1)];
        let right = ids[(x + 1).min(3)];
        let blended = (palette.color(left)[0] + palette.color(right)[0]) / 2.0;
        assert_eq!(palette.color(row[x + 1]), &[blended]);
    }

    #[test]
    fn flipped_maps_carve_rows() {
        let (mut palette, base) = noise(5, 8, 21);
        let mut vmap = VisibilityMap::new(&base, Orientation::Height);
        assert_eq!((vmap.width(), vmap.height()), (8, 5));
        extend(&mut vmap, &base, &palette, 3);
        let shorter = vmap.materialize(&base, &mut palette, 5);
        assert_eq!((shorter.width(), shorter.height()), (5, 5));
        let taller = vmap.materialize(&base, &mut palette, 11);
        assert_eq!((taller.width(), taller.height()), (5, 11));
    }

    #[test]
    fn rigidity_travels_with_its_pixels() {
        let (mut palette, mut base) = noise(6, 3, 13);
        let mask: Vec<f64> = (0..18).map(f64::from).collect();
        base.rigidity = TwoDimensionalMap::from_vec(6, 3, mask);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        extend(&mut vmap, &base, &palette, 2);
        let shrunk = vmap.materialize(&base, &mut palette, 4);
        let mask = shrunk.rigidity.as_ref().unwrap();
        for y in 0..3 {
            // The mask encodes each pixel's original address.
            let kept: Vec<f64> = (0..6)
                .filter(|&x| vmap.rank(x, y) == 0)
                .map(|x| f64::from(y * 6 + x))
                .collect();
            assert_eq!(mask.row(y), kept.as_slice());
        }
    }

    #[test]
    fn cancelling_keeps_whole_seams_only() {
        let (palette, base) = noise(8, 4, 17);
        let mut vmap = VisibilityMap::new(&base, Orientation::Width);
        let mut calls = 0;
        let mut stop_after_two = |_: f64| {
            calls += 1;
            calls < 2
        };
        let mut ticker = Ticker::new(&mut stop_after_two, 5);
        let outcome = vmap.extend_to(&base, &palette, &function(), 0.0, 5, &mut ticker);
        assert_eq!(outcome, Err(CarveError::Cancelled));
        assert_eq!(vmap.depth(), 2);
        assert!(vmap.seam(2).is_some());
        assert!(vmap.seam(3).is_none());
    }
}
