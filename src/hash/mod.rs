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

mod murmurhash;
mod pairwise;

pub(crate) use self::pairwise::HashFamily;
pub(crate) use self::pairwise::PairwiseHash;

use self::murmurhash::murmur3_x64_128;

/// The seed 9001 used when hashing record keys is a prime number that was
/// chosen very early on in experimental testing.
///
/// Choosing a seed is somewhat arbitrary, and the author cannot prove that
/// this particular seed is somehow superior to other seeds. All summaries of
/// the same stream must hash keys with the same seed, otherwise the assumed
/// 1:1 relationship between the original key bytes and the hashed bit string
/// would be violated.
pub(crate) const DEFAULT_UPDATE_SEED: u64 = 9001;

// A key hash of zero is reserved as the empty-slot sentinel of the
// approximate heavy-hitter store. A finalized hash of zero is remapped to
// this constant so that no live key is ever indistinguishable from an empty
// slot.
const ZERO_HASH_REMAP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hashes the raw bytes of a record key to the 64-bit key hash that every
/// summary operates on. Never returns zero.
pub(crate) fn key_hash(bytes: &[u8]) -> u64 {
    let (h1, _) = murmur3_x64_128(bytes, DEFAULT_UPDATE_SEED);
    if h1 == 0 { ZERO_HASH_REMAP } else { h1 }
}
