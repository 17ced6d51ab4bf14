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
use std::mem::size_of;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use priority_queue::PriorityQueue;

use crate::countsketch::CountSketch;
use crate::hash::PairwiseHash;

/// Slot value marking an unclaimed approximate slot. The hashing layer never
/// produces a zero key hash, so no live key collides with this sentinel.
pub(crate) const EMPTY_SLOT: u64 = 0;

/// Per-substream store of the keys currently considered heavy.
///
/// The exact store is a keyed min-heap of up to `capacity` entries, kept
/// behind a mutex so writers serialize and readers snapshot consistently.
/// The approximate store is a fixed array of atomic slots where each key
/// contends for the single slot its hash picks; the contender with the
/// larger sketch estimate survives. The approximate store is lock-free but
/// loses keys to slot collisions.
#[derive(Debug)]
pub(crate) enum HeavyHitters {
    Exact {
        queue: Mutex<PriorityQueue<u64, Reverse<i64>>>,
        capacity: usize,
    },
    Approximate {
        slots: Vec<AtomicU64>,
        slot_hash: PairwiseHash,
    },
}

impl HeavyHitters {
    pub(crate) fn exact(capacity: usize) -> Self {
        HeavyHitters::Exact {
            queue: Mutex::new(PriorityQueue::with_capacity(capacity)),
            capacity,
        }
    }

    pub(crate) fn approximate(capacity: usize, slot_hash: PairwiseHash) -> Self {
        HeavyHitters::Approximate {
            slots: (0..capacity).map(|_| AtomicU64::new(EMPTY_SLOT)).collect(),
            slot_hash,
        }
    }

    /// Offers a key observed at `count`; the caller has already applied the
    /// heaviness gate.
    pub(crate) fn offer(&self, sketch: &CountSketch, key_hash: u64, count: i64) {
        debug_assert_ne!(key_hash, EMPTY_SLOT, "zero key hash is reserved");
        match self {
            HeavyHitters::Exact { queue, capacity } => {
                let mut queue = queue.lock();
                if queue.len() < *capacity {
                    let _ = queue.push(key_hash, Reverse(count));
                    return;
                }
                let head = queue.peek().map(|(&key, _)| key);
                if let Some(head) = head {
                    // Evict on the head's current sketch estimate rather
                    // than its stored priority, which may be stale.
                    if sketch.estimate(head) < count {
                        let _ = queue.pop();
                        let _ = queue.remove(&key_hash);
                        let _ = queue.push(key_hash, Reverse(count));
                    }
                }
            }
            HeavyHitters::Approximate { slots, slot_hash } => {
                let idx = (slot_hash.apply(key_hash) % slots.len() as u64) as usize;
                loop {
                    let prev = slots[idx].load(Ordering::Acquire);
                    if prev == key_hash {
                        return;
                    }
                    let prev_count = if prev == EMPTY_SLOT {
                        0
                    } else {
                        sketch.estimate(prev)
                    };
                    if prev_count > count {
                        return;
                    }
                    if slots[idx]
                        .compare_exchange(prev, key_hash, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
            }
        }
    }

    /// Snapshots the store as `(key_hash, count)` pairs.
    ///
    /// Exact entries carry the priority recorded at their last accepted
    /// observation; approximate entries are re-estimated from the sketch
    /// since slots store only the key.
    pub(crate) fn entries(&self, sketch: &CountSketch) -> Vec<(u64, i64)> {
        match self {
            HeavyHitters::Exact { queue, .. } => queue
                .lock()
                .iter()
                .map(|(&key, &Reverse(count))| (key, count))
                .collect(),
            HeavyHitters::Approximate { slots, .. } => slots
                .iter()
                .map(|slot| slot.load(Ordering::Acquire))
                .filter(|&key| key != EMPTY_SLOT)
                .map(|key| (key, sketch.estimate(key)))
                .collect(),
        }
    }

    pub(crate) fn storage_size(&self) -> usize {
        match self {
            HeavyHitters::Exact { capacity, .. } => *capacity * size_of::<(u64, i64)>(),
            HeavyHitters::Approximate { slots, .. } => slots.len() * size_of::<u64>(),
        }
    }
}

impl Clone for HeavyHitters {
    fn clone(&self) -> Self {
        match self {
            HeavyHitters::Exact { queue, capacity } => HeavyHitters::Exact {
                queue: Mutex::new(queue.lock().clone()),
                capacity: *capacity,
            },
            HeavyHitters::Approximate { slots, slot_hash } => HeavyHitters::Approximate {
                slots: slots
                    .iter()
                    .map(|slot| AtomicU64::new(slot.load(Ordering::Acquire)))
                    .collect(),
                slot_hash: *slot_hash,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(sketch: &CountSketch, key: u64, times: i64) -> i64 {
        let mut last = 0;
        for _ in 0..times {
            last = sketch.update_and_estimate(key) + 1;
        }
        last
    }

    #[test]
    fn exact_store_is_bounded_with_unique_keys() {
        let sketch = CountSketch::new(5, 1024);
        let store = HeavyHitters::exact(4);
        for key in 1..=100u64 {
            let count = feed(&sketch, key, 1);
            store.offer(&sketch, key, count);
        }
        let entries = store.entries(&sketch);
        assert!(entries.len() <= 4);
        let mut keys: Vec<u64> = entries.iter().map(|&(k, _)| k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), entries.len());
    }

    #[test]
    fn exact_store_evicts_the_smallest_entry() {
        let sketch = CountSketch::new(5, 1024);
        let store = HeavyHitters::exact(2);
        let count_a = feed(&sketch, 1, 5);
        store.offer(&sketch, 1, count_a);
        let count_b = feed(&sketch, 2, 10);
        store.offer(&sketch, 2, count_b);
        let count_c = feed(&sketch, 3, 50);
        store.offer(&sketch, 3, count_c);

        let mut entries = store.entries(&sketch);
        entries.sort_unstable_by_key(|&(_, count)| Reverse(count));
        assert_eq!(entries, vec![(3, 50), (2, 10)]);
    }

    #[test]
    fn exact_store_updates_priority_in_place() {
        let sketch = CountSketch::new(5, 1024);
        let store = HeavyHitters::exact(2);
        let count = feed(&sketch, 7, 3);
        store.offer(&sketch, 7, count);
        let count = feed(&sketch, 7, 4);
        store.offer(&sketch, 7, count);
        assert_eq!(store.entries(&sketch), vec![(7, 7)]);
    }

    #[test]
    fn full_exact_store_readmits_a_resident_key() {
        let sketch = CountSketch::new(5, 1024);
        let store = HeavyHitters::exact(2);
        let count_a = feed(&sketch, 1, 5);
        store.offer(&sketch, 1, count_a);
        let count_b = feed(&sketch, 2, 10);
        store.offer(&sketch, 2, count_b);

        // The queue is full; a stronger observation of resident key 2
        // evicts the head and re-inserts the key with its new count.
        let count_b = feed(&sketch, 2, 10);
        store.offer(&sketch, 2, count_b);
        assert_eq!(store.entries(&sketch), vec![(2, 20)]);
    }

    #[test]
    fn approximate_store_keeps_the_larger_contender() {
        let slot_hash = PairwiseHash::from_params(0x1357_9bdf_2468, 99);
        // Probe for two keys that contend for the same of two slots.
        let anchor = 1u64;
        let anchor_slot = slot_hash.apply(anchor) % 2;
        let rival = (2u64..)
            .find(|&key| slot_hash.apply(key) % 2 == anchor_slot)
            .unwrap();

        let sketch = CountSketch::new(5, 1024);
        let store = HeavyHitters::approximate(2, slot_hash);

        let count = feed(&sketch, anchor, 10);
        store.offer(&sketch, anchor, count);
        let count = feed(&sketch, rival, 100);
        store.offer(&sketch, rival, count);

        let entries = store.entries(&sketch);
        assert_eq!(entries, vec![(rival, 100)]);

        // The incumbent with the larger estimate survives a weaker offer.
        store.offer(&sketch, anchor, 10);
        assert_eq!(store.entries(&sketch), vec![(rival, 100)]);
    }

    #[test]
    fn approximate_store_skips_empty_slots() {
        let sketch = CountSketch::new(5, 1024);
        let slot_hash = PairwiseHash::from_params(12345, 678);
        let store = HeavyHitters::approximate(8, slot_hash);
        assert!(store.entries(&sketch).is_empty());

        let count = feed(&sketch, 42, 3);
        store.offer(&sketch, 42, count);
        assert_eq!(store.entries(&sketch), vec![(42, 3)]);
    }
}
