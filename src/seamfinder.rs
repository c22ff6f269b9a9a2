// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Find the cheapest seam through an energy field.
//!
//! A seam runs from the top row to the bottom row, one pixel per row,
//! each step moving at most one column left or right.  The cheapest
//! one is found with the usual dynamic program: every cell of a
//! cumulative table holds the cost of the cheapest seam ending there,
//! plus a pointer to the cell in the row above that it came from.
//!
//! Ties are broken the same way every time, because the order in
//! which seams come out is recorded permanently by the visibility map:
//! straight down beats left, left beats right, and at the bottom the
//! leftmost cheapest cell wins.

use crate::cq;
use crate::twodmap::TwoDimensionalMap;
use std::cmp::Ordering;

#[derive(Default, Debug, Copy, Clone)]
pub(crate) struct EnergyAndBackPointer<P: Default + Copy> {
    pub energy: P,
    pub parent: u32,
}

/// True if `seam` has one entry per row, every entry is inside the
/// row, and consecutive entries are at most one column apart.
pub fn seam_is_valid(seam: &[u32], width: u32, height: u32) -> bool {
    seam.len() == height as usize
        && seam.iter().all(|&x| x < width)
        && seam
            .windows(2)
            .all(|pair| (i64::from(pair[0]) - i64::from(pair[1])).abs() <= 1)
}

/// Given the energy rows of a region (all the same length), return the
/// list of x-coordinates that, when mapped with the range (0..height),
/// give the pixels of the cheapest seam.
///
/// `mask`, when given, is added to the energy of every pixel before
/// anything is summed, and also scales the `rigidity` charged for each
/// sideways step into that pixel.
pub fn energy_to_seam(energy: &[Vec<f64>], mask: Option<&[Vec<f64>]>, rigidity: f64) -> Vec<u32> {
    let height = energy.len() as u32;
    let width = energy.first().map_or(0, |row| row.len()) as u32;
    assert!(width > 0 && height > 0, "seam requested through an empty region");

    let mask_at = |x: u32, y: u32| mask.map(|m| m[y as usize][x as usize]);
    let cost = |x: u32, y: u32| energy[y as usize][x as usize] + mask_at(x, y).unwrap_or(0.0);

    let mut target: TwoDimensionalMap<EnergyAndBackPointer<f64>> =
        TwoDimensionalMap::new(width, height);

    // Populate the first row with their native costs.
    for x in 0..width {
        target[(x, 0)] = EnergyAndBackPointer {
            energy: cost(x, 0),
            parent: x,
        };
    }

    let maxwidth = width - 1;
    // For every subsequent row, populate the target cell with the sum
    // of the *lowest adjacent upper cost* and the *x coordinate of that
    // cost*.  Candidates are listed straight, left, right; min_by keeps
    // the first of equal minima.
    for y in 1..height {
        for x in 0..width {
            let step = rigidity * mask_at(x, y).unwrap_or(1.0);
            let reach = |px: u32| target[(px, y - 1)].energy + cq!(px == x, 0.0, step);
            let parent_x = [Some(x), x.checked_sub(1), cq!(x < maxwidth, Some(x + 1), None)]
                .iter()
                .flatten()
                .copied()
                .min_by(|a, b| reach(*a).partial_cmp(&reach(*b)).unwrap_or(Ordering::Equal))
                .unwrap_or(x);
            let total = cost(x, y) + reach(parent_x);
            target[(x, y)] = EnergyAndBackPointer {
                energy: total,
                parent: parent_x,
            };
        }
    }

    // Find the x coordinate of the bottommost seam with the least cost.
    let last = height - 1;
    let mut seam_col = (0..width)
        .min_by(|a, b| {
            target[(*a, last)]
                .energy
                .partial_cmp(&target[(*b, last)].energy)
                .unwrap_or(Ordering::Equal)
        })
        .unwrap_or(0);
    assert!(
        target[(seam_col, last)].energy.is_finite(),
        "no seam of finite cost through a {}x{} field",
        width,
        height
    );

    // Working backwards, generate a vec of x coordinates that that map to
    // the seam, reverse and return.
    (0..height)
        .rev()
        .fold(Vec::<u32>::with_capacity(height as usize), |mut acc, y| {
            acc.push(seam_col);
            seam_col = target[(seam_col, y)].parent;
            acc
        })
        .into_iter()
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENERGY_DATA: [f64; 20] = [
        9., 9., 0., 9., 9., 9., 1., 9., 8., 9., 9., 9., 9., 9., 0., 9., 9., 9., 0., 9.,
    ];

    fn rows(width: usize, data: &[f64]) -> Vec<Vec<f64>> {
        data.chunks(width).map(|r| r.to_vec()).collect()
    }

    #[test]
    fn energy_grid_to_seam() {
        let energies = rows(5, &ENERGY_DATA);
        assert_eq!(energy_to_seam(&energies, None, 0.0), [2, 3, 4, 3]);
    }

    #[test]
    fn ties_prefer_straight_over_left() {
        let energies = rows(3, &[0., 0., 5., 9., 0., 9.]);
        assert_eq!(energy_to_seam(&energies, None, 0.0), [1, 1]);
    }

    #[test]
    fn ties_prefer_straight_over_right() {
        let energies = rows(3, &[5., 0., 0., 9., 0., 9.]);
        assert_eq!(energy_to_seam(&energies, None, 0.0), [1, 1]);
    }

    #[test]
    fn ties_prefer_left_over_right() {
        let energies = rows(3, &[0., 5., 0., 9., 0., 9.]);
        assert_eq!(energy_to_seam(&energies, None, 0.0), [0, 1]);
    }

    #[test]
    fn flat_fields_give_the_leftmost_straight_seam() {
        let energies = vec![vec![0.0; 4]; 4];
        assert_eq!(energy_to_seam(&energies, None, 0.0), [0, 0, 0, 0]);
    }

    #[test]
    fn rigidity_straightens_the_seam() {
        let energies = rows(3, &[0., 9., 9., 9., 0., 9., 0., 9., 9.]);
        assert_eq!(energy_to_seam(&energies, None, 0.0), [0, 1, 0]);
        assert_eq!(energy_to_seam(&energies, None, 10.0), [0, 0, 0]);
    }

    #[test]
    fn mask_pushes_the_seam_away() {
        let energies = vec![vec![0.0; 3]; 2];
        let mask = rows(3, &[5., 0., 0., 5., 0., 0.]);
        assert_eq!(energy_to_seam(&energies, Some(mask.as_slice()), 0.0), [1, 1]);
    }

    #[test]
    fn single_column_fields_have_one_seam() {
        let energies = rows(1, &[3., 1., 4.]);
        assert_eq!(energy_to_seam(&energies, None, 1.0), [0, 0, 0]);
    }

    #[test]
    fn seams_are_always_connected() {
        // A small linear congruential generator keeps this reproducible.
        let mut state: u64 = 0x2545_f491;
        let mut next = move || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (state >> 33) as f64 / f64::from(u32::MAX)
        };
        for &(w, h) in &[(1usize, 5usize), (2, 7), (9, 4), (16, 16)] {
            let energies: Vec<Vec<f64>> = (0..h).map(|_| (0..w).map(|_| next()).collect()).collect();
            let seam = energy_to_seam(&energies, None, 0.0);
            assert!(seam_is_valid(&seam, w as u32, h as u32), "{:?}", seam);
        }
    }

    #[test]
    #[should_panic(expected = "finite cost")]
    fn infinite_fields_are_a_bug() {
        let energies = vec![vec![f64::INFINITY; 2]; 2];
        energy_to_seam(&energies, None, 0.0);
    }
}
