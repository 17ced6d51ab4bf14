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

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::countsketch::CountSketch;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::schema::Schema;
use crate::universal::sketch::UniversalSketch;
use crate::universal::substream::SubstreamSummary;

/// Builder for creating [`UniversalSketch`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): Specify relative error and
///   failure probability; the sketch shape is derived (recommended)
/// - [`with_shape()`](Self::with_shape): Specify layer count and sketch
///   dimensions directly (manual)
#[derive(Debug, Clone)]
pub struct UniversalSketchBuilder {
    layers: Option<usize>,
    depth: usize,
    width: usize,
    k: usize,
    a: f64,
    precise: bool,
    seed: Option<u64>,
}

impl UniversalSketchBuilder {
    /// Creates a builder with a derived shape for a target accuracy.
    ///
    /// The count-sketch width and depth are derived from `relative_error`
    /// and `failure_prob`; the layer count becomes one per bit of the
    /// tracked column's domain when the sketch is built.
    ///
    /// # Arguments
    ///
    /// - `relative_error`: Target relative error of point estimates
    /// - `failure_prob`: Probability a point estimate misses that target
    /// - `k`: Number of heavy hitters tracked per layer
    /// - `a`: Heaviness threshold; a key is heavy when its estimated count
    ///   reaches `a * sqrt(l2_squared)`
    ///
    /// # Panics
    ///
    /// Panics if `relative_error` or `failure_prob` is not in (0, 1).
    ///
    /// # Examples
    ///
    /// ```
    /// # use unisketch::schema::Column;
    /// # use unisketch::schema::Schema;
    /// # use unisketch::universal::UniversalSketchBuilder;
    /// let schema = Schema::new(vec![Column::new("src_addr", 4)]);
    /// let sketch = UniversalSketchBuilder::with_accuracy(0.1, 0.05, 16, 0.01)
    ///     .build(schema, "src_addr")
    ///     .unwrap();
    /// assert_eq!(sketch.num_layers(), 32); // one layer per column bit
    /// ```
    pub fn with_accuracy(relative_error: f64, failure_prob: f64, k: usize, a: f64) -> Self {
        UniversalSketchBuilder {
            layers: None,
            depth: CountSketch::suggest_depth(failure_prob),
            width: CountSketch::suggest_width(relative_error),
            k,
            a,
            precise: true,
            seed: None,
        }
    }

    /// Creates a builder with manual shape specification.
    ///
    /// # Arguments
    ///
    /// - `layers`: Number of substream layers
    /// - `depth`, `width`: Count-sketch shape per layer
    /// - `k`, `a`: Heavy-hitter capacity and heaviness threshold
    ///
    /// # Examples
    ///
    /// ```
    /// # use unisketch::schema::Column;
    /// # use unisketch::schema::Schema;
    /// # use unisketch::universal::UniversalSketchBuilder;
    /// let schema = Schema::new(vec![Column::new("key", 8)]);
    /// let sketch = UniversalSketchBuilder::with_shape(8, 5, 2048, 32, 0.01)
    ///     .build(schema, "key")
    ///     .unwrap();
    /// assert_eq!(sketch.num_layers(), 8);
    /// ```
    pub fn with_shape(layers: usize, depth: usize, width: usize, k: usize, a: f64) -> Self {
        UniversalSketchBuilder {
            layers: Some(layers),
            depth,
            width,
            k,
            a,
            precise: true,
            seed: None,
        }
    }

    /// Selects the heavy-hitter mode for all layers (default: precise).
    ///
    /// Precise mode records heavy hitters exactly in a keyed priority queue
    /// at the cost of serializing heavy-hitter updates per layer.
    /// Approximate mode uses lock-free hashed slots and may lose keys to
    /// slot collisions.
    pub fn precise(mut self, precise: bool) -> Self {
        self.precise = precise;
        self
    }

    /// Seeds every hash of the sketch deterministically.
    ///
    /// Two sketches built with the same parameters and seed make identical
    /// routing and estimation decisions. Without a seed, hashes are drawn
    /// from OS randomness.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the universal sketch over `column` of `schema`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] naming the rejected parameter if the column is
    /// not part of the schema, the layer count is 0, the count-sketch shape
    /// is degenerate, `k` is 0, or `a` is not positive and finite.
    pub fn build(self, schema: Schema, column: &str) -> Result<UniversalSketch, Error> {
        let column = schema
            .column(column)
            .ok_or_else(|| {
                Error::invalid("column", format!("{column:?} is not part of the schema"))
            })?
            .clone();

        let layers = self.layers.unwrap_or(8 * column.width());
        if layers == 0 {
            return Err(Error::invalid("layers", "must be at least 1"));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let level_hashes = HashFamily::with_members(layers - 1, &mut rng);
        let substreams = (0..layers)
            .map(|_| {
                SubstreamSummary::with_rng(
                    self.depth,
                    self.width,
                    self.k,
                    self.a,
                    self.precise,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(UniversalSketch::new(
            substreams,
            level_hashes,
            schema,
            column,
            self.precise,
        ))
    }
}
