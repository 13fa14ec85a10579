//! Bounded best-first collection of correlation peaks.

use std::cmp::Ordering;

/// Correlation peak at a template placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Column of the template's top-left corner.
    pub x: usize,
    /// Row of the template's top-left corner.
    pub y: usize,
    /// ZNCC score at the placement.
    pub score: f64,
}

/// Ranking order: higher score first, then row-major position.
fn rank(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

pub(crate) fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(rank);
}

/// Keeps the `k` best peaks seen so far, always in rank order.
pub struct TopK {
    k: usize,
    ranked: Vec<Peak>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ranked: Vec::with_capacity(k.min(4096)),
        }
    }

    /// Number of peaks currently held.
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Offers a peak; it is dropped when `k` better ones are already held.
    pub fn push(&mut self, peak: Peak) {
        if self.k == 0 {
            return;
        }
        if self.ranked.len() == self.k {
            let beats_worst = self
                .ranked
                .last()
                .is_some_and(|worst| rank(&peak, worst) == Ordering::Less);
            if !beats_worst {
                return;
            }
            self.ranked.pop();
        }
        let at = self
            .ranked
            .partition_point(|held| rank(held, &peak) != Ordering::Greater);
        self.ranked.insert(at, peak);
    }

    /// Returns the held peaks, best first.
    pub fn into_sorted_desc(self) -> Vec<Peak> {
        self.ranked
    }
}
