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

use rand::Rng;

// The Mersenne prime 2^61 - 1. Carter-Wegman hashing over this modulus is
// 2-wise independent and reduces with shifts instead of division.
const MERSENNE_PRIME: u128 = (1u128 << 61) - 1;

/// A 2-wise independent hash `x -> (a*x + b) mod (2^61 - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PairwiseHash {
    a: u64,
    b: u64,
}

impl PairwiseHash {
    /// Draws an independently seeded member of the family.
    pub(crate) fn generate_random<R: Rng>(rng: &mut R) -> Self {
        PairwiseHash {
            a: rng.random_range(1..MERSENNE_PRIME as u64),
            b: rng.random_range(0..MERSENNE_PRIME as u64),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_params(a: u64, b: u64) -> Self {
        debug_assert!(a >= 1 && (a as u128) < MERSENNE_PRIME);
        debug_assert!((b as u128) < MERSENNE_PRIME);
        PairwiseHash { a, b }
    }

    /// Applies the hash. The result is always below 2^61 - 1.
    pub(crate) fn apply(&self, x: u64) -> u64 {
        let product = self.a as u128 * x as u128 + self.b as u128;
        // Two rounds of Mersenne reduction bring a 125-bit intermediate
        // below 2^62, then one conditional subtraction lands in [0, p).
        let mut result = (product & MERSENNE_PRIME) + (product >> 61);
        result = (result & MERSENNE_PRIME) + (result >> 61);
        if result >= MERSENNE_PRIME {
            result -= MERSENNE_PRIME;
        }
        result as u64
    }
}

/// An indexable family of independently seeded pairwise-independent hashes.
///
/// Member `i` selects whether a key propagates past layer boundary `i`, so
/// all members are drawn up front when the owning sketch is constructed.
#[derive(Debug, Clone)]
pub(crate) struct HashFamily {
    members: Vec<PairwiseHash>,
}

impl HashFamily {
    /// Draws `n` independently seeded members.
    pub(crate) fn with_members<R: Rng>(n: usize, rng: &mut R) -> Self {
        let members = (0..n).map(|_| PairwiseHash::generate_random(rng)).collect();
        HashFamily { members }
    }

    /// Applies member `i` to `x`.
    pub(crate) fn hash(&self, i: usize, x: u64) -> u64 {
        self.members[i].apply(x)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn apply_is_deterministic_and_bounded() {
        let hash = PairwiseHash::from_params(0x1234_5678_9abc_def, 42);
        for x in [0u64, 1, u64::MAX, 0xdead_beef] {
            assert_eq!(hash.apply(x), hash.apply(x));
            assert!((hash.apply(x) as u128) < MERSENNE_PRIME);
        }
    }

    #[test]
    fn parity_is_roughly_balanced() {
        let mut rng = StdRng::seed_from_u64(7);
        let hash = PairwiseHash::generate_random(&mut rng);
        let odd = (0u64..10_000).filter(|x| hash.apply(*x) % 2 == 1).count();
        assert!((4_000..6_000).contains(&odd), "odd={odd}");
    }

    #[test]
    fn family_members_are_independent() {
        let mut rng = StdRng::seed_from_u64(7);
        let family = HashFamily::with_members(4, &mut rng);
        let outputs: Vec<u64> = (0..4).map(|i| family.hash(i, 12345)).collect();
        for i in 0..outputs.len() {
            for j in i + 1..outputs.len() {
                assert_ne!(outputs[i], outputs[j]);
            }
        }
    }
}
