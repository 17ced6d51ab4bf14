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

//! Count-sketch implementation for approximate frequency estimation.
//!
//! A count-sketch is a depth x width matrix of signed counters. Each row has
//! an independent pairwise hash selecting a cell and another selecting a sign
//! in `{+1, -1}`; a point query reads one signed cell per row and returns the
//! median. Unlike count-min, the signed cells make the estimator unbiased, at
//! the cost of occasionally returning small negative values for keys that
//! were never inserted.
//!
//! All cells are atomic, so updates from any number of threads interleave
//! safely and queries never block.
//!
//! # Usage
//!
//! ```rust
//! use unisketch::countsketch::CountSketch;
//!
//! let sketch = CountSketch::new(5, 1024);
//! for _ in 0..100 {
//!     sketch.update_and_estimate(0xfeed_beef);
//! }
//! assert_eq!(sketch.estimate(0xfeed_beef), 100);
//! ```
//!
//! # References
//!
//! - Charikar, Chen, Farach-Colton (2002). "Finding frequent items in data
//!   streams"

mod sketch;

pub use self::sketch::CountSketch;
