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

//! Universal sketch for streaming frequency-moment estimation.
//!
//! A universal sketch summarizes one column of a record stream in `L`
//! layers. Layer 0 sees every key; each deeper layer sees an expected half
//! of the previous layer's keys, selected by a 2-wise independent level
//! hash. Every layer keeps a count-sketch, the running squared L2 norm of
//! its substream, and the keys currently heavy in it.
//!
//! This layering is what makes the sketch *universal*: a single structure
//! answers any G-sum `Σ g(f_i)` whose `g` is dominated by heavy hitters, by
//! telescoping the per-layer heavy-hitter sums from the deepest layer back
//! to layer 0. Frequency moments (`F_1` stream length, `F_2` repeat rate)
//! are one-line closures.
//!
//! # Properties
//!
//! - **Concurrent**: updates and queries take `&self`; counters and
//!   approximate heavy-hitter slots are atomic. In precise mode each
//!   layer's heavy-hitter queue serializes behind its own short lock.
//! - **Compact**: storage is `L` layers of a `depth x width` counter table
//!   plus `k` heavy-hitter entries per layer, independent of stream length.
//! - **Probabilistic**: point estimates and G-sums carry count-sketch
//!   error; the tracked L2 norm is itself an estimate, so heaviness
//!   decisions inherit that bias.
//!
//! # Usage
//!
//! ```rust
//! use unisketch::schema::Column;
//! use unisketch::schema::Record;
//! use unisketch::schema::Schema;
//! use unisketch::universal::UniversalSketchBuilder;
//!
//! let schema = Schema::new(vec![Column::new("user", 8)]);
//! let sketch = UniversalSketchBuilder::with_shape(8, 5, 2048, 32, 0.01)
//!     .build(schema, "user")
//!     .unwrap();
//!
//! for _ in 0..100 {
//!     sketch.update(&Record::new(vec![7_u64.to_le_bytes().to_vec()]));
//! }
//!
//! assert_eq!(sketch.estimate(&7_u64.to_le_bytes()), 100);
//! let stream_length: i64 = sketch.evaluate(|x| x);
//! assert_eq!(stream_length, 100);
//! ```
//!
//! # References
//!
//! - Braverman, Ostrovsky (2010). "Zero-one frequency laws"
//! - Liu, Braverman, Ivkin, Braverman, Sekar (2016). "One sketch to rule
//!   them all: rethinking network flow monitoring with UnivMon"

mod builder;
mod heavy_hitters;
mod sketch;
mod substream;

pub use self::builder::UniversalSketchBuilder;
pub use self::sketch::UniversalSketch;
pub use self::substream::SubstreamSummary;
