// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::mem::size_of;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::hash::PairwiseHash;

const MAX_TABLE_ENTRIES: usize = 1 << 30;

/// Count sketch for estimating item frequencies under concurrent updates.
///
/// The sketch provides unbiased point estimates with relative error
/// controlled by the width and failure probability controlled by the depth.
/// Every cell is an [`AtomicI64`], so any number of writers and readers may
/// operate on the same sketch without locks.
#[derive(Debug)]
pub struct CountSketch {
    depth: usize,
    width: usize,
    cells: Vec<AtomicI64>,
    index_hashes: Vec<PairwiseHash>,
    sign_hashes: Vec<PairwiseHash>,
}

impl CountSketch {
    /// Creates a new count sketch with randomly seeded row hashes.
    ///
    /// # Panics
    ///
    /// Panics if `depth` or `width` is 0, or the total table size exceeds
    /// the supported limit.
    pub fn new(depth: usize, width: usize) -> Self {
        Self::with_rng(depth, width, &mut StdRng::from_os_rng())
    }

    /// Creates a new count sketch drawing its row hashes from `rng`.
    ///
    /// # Panics
    ///
    /// Panics if `depth` or `width` is 0, or the total table size exceeds
    /// the supported limit.
    pub(crate) fn with_rng<R: Rng>(depth: usize, width: usize, rng: &mut R) -> Self {
        let entries = entries_for_shape(depth, width);
        let cells = (0..entries).map(|_| AtomicI64::new(0)).collect();
        let mut index_hashes = Vec::with_capacity(depth);
        let mut sign_hashes = Vec::with_capacity(depth);
        for _ in 0..depth {
            index_hashes.push(PairwiseHash::generate_random(rng));
            sign_hashes.push(PairwiseHash::generate_random(rng));
        }
        CountSketch {
            depth,
            width,
            cells,
            index_hashes,
            sign_hashes,
        }
    }

    /// Returns the number of rows (independent estimates).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of buckets per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Suggests the width achieving the given relative error.
    ///
    /// # Panics
    ///
    /// Panics if `relative_error` is not in (0, 1).
    pub fn suggest_width(relative_error: f64) -> usize {
        assert!(
            relative_error > 0.0 && relative_error < 1.0,
            "relative_error must be between 0 and 1.0 (exclusive)"
        );
        (3.0 / (relative_error * relative_error)).ceil() as usize
    }

    /// Suggests the depth achieving the given failure probability.
    ///
    /// # Panics
    ///
    /// Panics if `failure_prob` is not in (0, 1).
    pub fn suggest_depth(failure_prob: f64) -> usize {
        assert!(
            failure_prob > 0.0 && failure_prob < 1.0,
            "failure_prob must be between 0 and 1.0 (exclusive)"
        );
        ((1.0 / failure_prob).ln().ceil() as usize).max(1)
    }

    /// Adds one occurrence of the key and returns the estimate of its count
    /// just before this update.
    ///
    /// The returned value is the median of the signed cell reads captured by
    /// the same atomic adds that apply the increment, so concurrent callers
    /// each observe a consistent pre-update estimate of their own update.
    pub fn update_and_estimate(&self, key_hash: u64) -> i64 {
        let mut priors = Vec::with_capacity(self.depth);
        for row in 0..self.depth {
            let sign = self.sign(row, key_hash);
            let prior = self.cells[self.cell_index(row, key_hash)].fetch_add(sign, Ordering::Relaxed);
            priors.push(sign * prior);
        }
        median(&mut priors)
    }

    /// Returns the estimated count of the key.
    ///
    /// Keys that were never inserted estimate around zero and may come out
    /// slightly negative.
    pub fn estimate(&self, key_hash: u64) -> i64 {
        let mut reads = Vec::with_capacity(self.depth);
        for row in 0..self.depth {
            let cell = self.cells[self.cell_index(row, key_hash)].load(Ordering::Relaxed);
            reads.push(self.sign(row, key_hash) * cell);
        }
        median(&mut reads)
    }

    /// Returns the size of the counter table in bytes.
    pub fn storage_size(&self) -> usize {
        self.cells.len() * size_of::<i64>()
    }

    fn cell_index(&self, row: usize, key_hash: u64) -> usize {
        let column = (self.index_hashes[row].apply(key_hash) % self.width as u64) as usize;
        row * self.width + column
    }

    fn sign(&self, row: usize, key_hash: u64) -> i64 {
        if self.sign_hashes[row].apply(key_hash) & 1 == 0 {
            1
        } else {
            -1
        }
    }
}

impl Clone for CountSketch {
    /// Copies the sketch cell by cell.
    ///
    /// Cells are copied by individual atomic load, so a clone taken during
    /// concurrent updates is an advisory snapshot, not a coherent one.
    fn clone(&self) -> Self {
        CountSketch {
            depth: self.depth,
            width: self.width,
            cells: self
                .cells
                .iter()
                .map(|cell| AtomicI64::new(cell.load(Ordering::Relaxed)))
                .collect(),
            index_hashes: self.index_hashes.clone(),
            sign_hashes: self.sign_hashes.clone(),
        }
    }
}

fn entries_for_shape(depth: usize, width: usize) -> usize {
    assert!(depth > 0, "depth must be at least 1");
    assert!(width > 0, "width must be at least 1");
    let entries = depth
        .checked_mul(width)
        .expect("depth * width overflows usize");
    assert!(
        entries < MAX_TABLE_ENTRIES,
        "depth * width must be < {}",
        MAX_TABLE_ENTRIES
    );
    entries
}

fn median(values: &mut [i64]) -> i64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        let left = values[mid - 1] as i128;
        let right = values[mid] as i128;
        ((left + right) / 2) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_returns_prior_estimate() {
        let sketch = CountSketch::new(5, 1024);
        for expected_prior in 0..50 {
            assert_eq!(sketch.update_and_estimate(42), expected_prior);
        }
        assert_eq!(sketch.estimate(42), 50);
    }

    #[test]
    fn median_of_even_depth_averages_middle_pair() {
        assert_eq!(median(&mut [1, 3]), 2);
        assert_eq!(median(&mut [-5, -1, 2, 10]), 0);
        assert_eq!(median(&mut [7]), 7);
    }

    #[test]
    fn clone_snapshots_cells() {
        let sketch = CountSketch::new(3, 64);
        sketch.update_and_estimate(1);
        sketch.update_and_estimate(1);
        let copy = sketch.clone();
        sketch.update_and_estimate(1);
        assert_eq!(copy.estimate(1), 2);
        assert_eq!(sketch.estimate(1), 3);
    }
}
