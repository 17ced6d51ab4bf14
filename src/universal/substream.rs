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

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::countsketch::CountSketch;
use crate::error::Error;
use crate::hash::PairwiseHash;
use crate::universal::heavy_hitters::HeavyHitters;

/// Summary of one substream of the key stream: a count-sketch, the running
/// squared L2 norm of the substream, and the keys currently heavy in it.
///
/// A key is heavy when its estimated count reaches `a * sqrt(l2_squared)` at
/// the moment it is observed. The exact store records such keys in a keyed
/// min-heap with the observed count as priority; the approximate store lets
/// them contend for hashed slots without locking.
///
/// All update paths are safe under concurrent callers. The heavy-hitter
/// update may observe an `l2_squared` that other writers have already grown
/// past the value this writer's own update produced; the gate only becomes
/// stricter from that, never looser.
#[derive(Debug)]
pub struct SubstreamSummary {
    hh_threshold: f64,
    l2_squared: AtomicI64,
    sketch: CountSketch,
    heavy_hitters: HeavyHitters,
}

impl SubstreamSummary {
    /// Creates a substream summary with a `depth x width` count-sketch,
    /// up to `k` tracked heavy hitters and heaviness threshold `a`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] naming the rejected parameter if `depth`,
    /// `width` or `k` is 0, or `a` is not a positive finite number.
    pub fn new(depth: usize, width: usize, k: usize, a: f64, precise: bool) -> Result<Self, Error> {
        Self::with_rng(depth, width, k, a, precise, &mut StdRng::from_os_rng())
    }

    pub(crate) fn with_rng<R: Rng>(
        depth: usize,
        width: usize,
        k: usize,
        a: f64,
        precise: bool,
        rng: &mut R,
    ) -> Result<Self, Error> {
        if depth == 0 {
            return Err(Error::invalid("depth", "must be at least 1"));
        }
        if width == 0 {
            return Err(Error::invalid("width", "must be at least 1"));
        }
        if k == 0 {
            return Err(Error::invalid("k", "must be at least 1"));
        }
        if !a.is_finite() || a <= 0.0 {
            return Err(Error::invalid(
                "a",
                format!("must be positive and finite, got {a}"),
            ));
        }

        let heavy_hitters = if precise {
            HeavyHitters::exact(k)
        } else {
            HeavyHitters::approximate(k, PairwiseHash::generate_random(rng))
        };
        Ok(SubstreamSummary {
            hh_threshold: a,
            l2_squared: AtomicI64::new(0),
            sketch: CountSketch::with_rng(depth, width, rng),
            heavy_hitters,
        })
    }

    /// Incorporates one occurrence of the key.
    ///
    /// The sketch is updated first and returns the pre-update estimate; the
    /// squared L2 norm then grows by the change `(old+1)^2 - old^2` that
    /// estimate implies, and the key is offered to the heavy-hitter store if
    /// its new count clears the heaviness gate.
    pub fn update(&self, key_hash: u64) {
        let old_count = self.sketch.update_and_estimate(key_hash);
        // A colliding key can estimate negative; the norm delta clamps the
        // prior at zero so l2_squared stays non-decreasing.
        let delta = 2 * old_count.max(0) + 1;
        let old_l2_squared = self.l2_squared.fetch_add(delta, Ordering::Relaxed);
        let new_l2 = ((old_l2_squared + delta) as f64).sqrt();

        let new_count = old_count + 1;
        if (new_count as f64) < self.hh_threshold * new_l2 {
            return;
        }
        self.heavy_hitters.offer(&self.sketch, key_hash, new_count);
    }

    /// Returns the estimated count of the key in this substream.
    pub fn estimate(&self, key_hash: u64) -> i64 {
        self.sketch.estimate(key_hash)
    }

    /// Returns the running estimate of the substream's squared L2 norm.
    pub fn l2_squared(&self) -> i64 {
        self.l2_squared.load(Ordering::Relaxed)
    }

    /// Returns the size of the summary in bytes.
    pub fn storage_size(&self) -> usize {
        self.sketch.storage_size() + self.heavy_hitters.storage_size()
    }

    pub(crate) fn heavy_hitter_entries(&self) -> Vec<(u64, i64)> {
        self.heavy_hitters.entries(&self.sketch)
    }
}

impl Clone for SubstreamSummary {
    /// Copies the summary field by field.
    ///
    /// The norm, the sketch cells and the heavy-hitter slots are copied by
    /// individual atomic load, so a clone taken during concurrent updates is
    /// an advisory snapshot, not a coherent one.
    fn clone(&self) -> Self {
        SubstreamSummary {
            hh_threshold: self.hh_threshold,
            l2_squared: AtomicI64::new(self.l2_squared.load(Ordering::Relaxed)),
            sketch: self.sketch.clone(),
            heavy_hitters: self.heavy_hitters.clone(),
        }
    }
}
