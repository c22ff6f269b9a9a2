// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progress reporting.
//!
//! The carver reports once per seam, with the fraction of the current
//! resize that is done.  A reporter can cancel the resize by returning
//! `false`; the carver then puts everything back as it was.

use crate::errors::CarveError;

pub trait Progress {
    /// Called once, before the first seam.
    fn start(&mut self) {}

    /// A fraction in `[0, 1]`, never smaller than the previous one.
    /// Return `false` to cancel.
    fn update(&mut self, fraction: f64) -> bool;

    /// Called once the resize has completed.
    fn finish(&mut self) {}
}

/// Reports nowhere and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _fraction: f64) -> bool {
        true
    }
}

impl<F> Progress for F
where
    F: FnMut(f64) -> bool,
{
    fn update(&mut self, fraction: f64) -> bool {
        self(fraction)
    }
}

/// Counts seams against the total a resize needs.
pub(crate) struct Ticker<'a> {
    progress: &'a mut dyn Progress,
    done: u32,
    total: u32,
}

impl<'a> Ticker<'a> {
    pub fn new(progress: &'a mut dyn Progress, total: u32) -> Self {
        progress.start();
        Ticker {
            progress,
            done: 0,
            total,
        }
    }

    /// One more seam is done.
    pub fn tick(&mut self) -> Result<(), CarveError> {
        self.done = (self.done + 1).min(self.total);
        let fraction = if self.total == 0 {
            1.0
        } else {
            f64::from(self.done) / f64::from(self.total)
        };
        if self.progress.update(fraction) {
            Ok(())
        } else {
            Err(CarveError::Cancelled)
        }
    }

    pub fn finish(self) {
        if self.done < self.total || self.total == 0 {
            self.progress.update(1.0);
        }
        self.progress.finish();
    }
}
