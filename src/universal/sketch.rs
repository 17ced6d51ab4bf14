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

use std::cmp::Reverse;
use std::ops::Add;
use std::ops::Sub;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::hash;
use crate::hash::HashFamily;
use crate::schema::Column;
use crate::schema::Record;
use crate::schema::Schema;
use crate::universal::substream::SubstreamSummary;

/// Universal sketch over one column of a record stream.
///
/// The sketch owns `L` substream summaries. Layer 0 sees every key; each
/// deeper layer sees the keys whose level hash at the previous boundary is
/// odd, halving the expected substream in a 2-wise independent way. G-sums
/// are estimated by telescoping the layers' heavy-hitter sets from the
/// deepest layer back to layer 0.
///
/// All mutating and reading operations take `&self` and are safe to call
/// from any number of threads; see
/// [`UniversalSketchBuilder`](crate::universal::UniversalSketchBuilder) for
/// construction.
#[derive(Debug)]
pub struct UniversalSketch {
    substreams: Vec<SubstreamSummary>,
    level_hashes: HashFamily,
    schema: Schema,
    column: Column,
    precise_hh: bool,
    valid: AtomicBool,
}

impl UniversalSketch {
    pub(crate) fn new(
        substreams: Vec<SubstreamSummary>,
        level_hashes: HashFamily,
        schema: Schema,
        column: Column,
        precise_hh: bool,
    ) -> Self {
        UniversalSketch {
            substreams,
            level_hashes,
            schema,
            column,
            precise_hh,
            valid: AtomicBool::new(true),
        }
    }

    /// Updates the sketch with one record.
    ///
    /// The tracked column's bytes are hashed and the key hash is routed down
    /// the layer chain.
    ///
    /// # Panics
    ///
    /// Panics if the record has fewer fields than the tracked column index.
    pub fn update(&self, record: &Record) {
        self.update_hashed(hash::key_hash(record.field(self.column.idx())));
    }

    /// Updates the sketch with a pre-hashed key.
    ///
    /// Layer 0 is always updated; layer `i > 0` is updated while the level
    /// hash at boundary `i - 1` is odd, stopping at the first even bit. A
    /// key hash of 0 is reserved for empty approximate slots and must not
    /// be passed; hashes produced by [`update`](UniversalSketch::update)
    /// are never 0.
    pub fn update_hashed(&self, key_hash: u64) {
        debug_assert_ne!(key_hash, 0, "zero key hash is reserved");
        self.substreams[0].update(key_hash);
        for i in 1..self.substreams.len() {
            if self.level_hashes.hash(i - 1, key_hash) % 2 == 0 {
                break;
            }
            self.substreams[i].update(key_hash);
        }
    }

    /// Returns the estimated frequency of a key given its raw bytes.
    ///
    /// Keys that were never inserted estimate around zero and may come out
    /// slightly negative.
    pub fn estimate(&self, key: &[u8]) -> i64 {
        self.estimate_hashed(hash::key_hash(key))
    }

    /// Returns the estimated frequency of a pre-hashed key.
    pub fn estimate_hashed(&self, key_hash: u64) -> i64 {
        self.substreams[0].estimate(key_hash)
    }

    /// Estimates the G-sum `Σ g(f_i)` over all distinct keys using every
    /// layer.
    ///
    /// Frequency moments are the special case `g(x) = x^k`; see
    /// [`evaluate_with_layers`](UniversalSketch::evaluate_with_layers).
    pub fn evaluate<R, G>(&self, g: G) -> R
    where
        R: Copy + Default + Add<Output = R> + Sub<Output = R>,
        G: Fn(i64) -> R,
    {
        self.evaluate_with_layers(g, self.substreams.len())
    }

    /// Estimates the G-sum using only the first `layers` layers.
    ///
    /// The deepest used layer contributes the plain sum of `g` over its
    /// heavy hitters; each shallower layer `i` then telescopes via
    /// `R := 2R + Σ ±g(count)`, where the sign is the Rademacher variable
    /// derived from the key's level-selection bit at boundary `i`. Exact
    /// heavy hitters contribute their recorded priority; approximate slots
    /// are re-estimated from their layer's sketch.
    ///
    /// # Panics
    ///
    /// Panics if `layers` is 0 or exceeds the layer count.
    pub fn evaluate_with_layers<R, G>(&self, g: G, layers: usize) -> R
    where
        R: Copy + Default + Add<Output = R> + Sub<Output = R>,
        G: Fn(i64) -> R,
    {
        assert!(
            layers >= 1 && layers <= self.substreams.len(),
            "layers must be between 1 and {}",
            self.substreams.len()
        );

        let base = layers - 1;
        let mut recursive_sum = R::default();
        for (_, count) in self.substreams[base].heavy_hitter_entries() {
            recursive_sum = recursive_sum + g(count);
        }

        for i in (0..base).rev() {
            let mut substream_sum = R::default();
            for (key_hash, count) in self.substreams[i].heavy_hitter_entries() {
                if self.level_hashes.hash(i, key_hash) % 2 == 1 {
                    substream_sum = substream_sum - g(count);
                } else {
                    substream_sum = substream_sum + g(count);
                }
            }
            recursive_sum = recursive_sum + recursive_sum + substream_sum;
        }
        recursive_sum
    }

    /// Returns the keys currently heavy in the full stream, most frequent
    /// first.
    ///
    /// Each entry is `(key_hash, count)` from the layer-0 heavy-hitter
    /// store: the recorded priority in precise mode, the current sketch
    /// estimate in approximate mode.
    pub fn heavy_hitters(&self) -> Vec<(u64, i64)> {
        let mut entries = self.substreams[0].heavy_hitter_entries();
        entries.sort_unstable_by_key(|&(_, count)| Reverse(count));
        entries
    }

    /// Returns the number of layers.
    pub fn num_layers(&self) -> usize {
        self.substreams.len()
    }

    /// Returns true if every layer tracks heavy hitters exactly.
    pub fn is_precise(&self) -> bool {
        self.precise_hh
    }

    /// Returns the schema of the summarized stream.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the tracked column.
    pub fn column(&self) -> &Column {
        &self.column
    }

    /// Marks the sketch invalid.
    ///
    /// Returns true for exactly one caller across all concurrent calls; the
    /// transition is one-shot and never reverts. In-flight updates are not
    /// stopped: after observing [`is_valid`](UniversalSketch::is_valid) as
    /// false, callers must treat further results as advisory.
    pub fn invalidate(&self) -> bool {
        self.valid
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns whether the sketch is still valid.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Returns the size of the sketch in bytes, summed over layers.
    pub fn storage_size(&self) -> usize {
        self.substreams.iter().map(|s| s.storage_size()).sum()
    }
}

impl Clone for UniversalSketch {
    /// Copies the sketch layer by layer.
    ///
    /// Atomic state is copied by individual load, so a clone taken during
    /// concurrent updates is an advisory snapshot, not a coherent one.
    fn clone(&self) -> Self {
        UniversalSketch {
            substreams: self.substreams.clone(),
            level_hashes: self.level_hashes.clone(),
            schema: self.schema.clone(),
            column: self.column.clone(),
            precise_hh: self.precise_hh,
            valid: AtomicBool::new(self.valid.load(Ordering::Acquire)),
        }
    }
}
