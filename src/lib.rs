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

//! # Universal Sketch Library
//!
//! A concurrent universal sketch for streaming frequency-moment estimation
//! over a single attribute of an unbounded record stream. The sketch keeps a
//! compact probabilistic summary that supports approximate point-frequency
//! queries, top-k heavy-hitter tracking, and estimation of arbitrary G-sums
//! `Σ g(f_i)` over all keys `i`, where `f_i` is the frequency of key `i` and
//! `g` is caller-supplied. Classical frequency moments `F_k` are the special
//! case `g(x) = x^k`.
//!
//! The library is divided into modules that constitute distinct groups of
//! functionality:
//!
//! - [`universal`]: the layered universal sketch and its per-layer substream
//!   summaries.
//! - [`countsketch`]: the concurrent count-sketch primitive underlying every
//!   substream summary.
//! - [`schema`]: the record, schema and column model used to extract the
//!   tracked attribute from incoming records.
//! - [`error`]: the error type returned by fallible constructors.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod countsketch;
pub mod error;
pub(crate) mod hash;
pub mod schema;
pub mod universal;
