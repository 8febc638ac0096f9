// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod bit_array;

use bit_array::BitArray;

/// A standard bloom filter
///
/// Built in one shot for a sealed chunk from its checkpoint snapshot, and
/// probed before point reads into that chunk to skip definite misses.
///
/// Instead of `k` independent hash functions, the probe slots for a key are
/// all derived from a single 128-bit digest (double hashing).
#[derive(Debug)]
pub struct BloomFilter {
    bits: BitArray,

    /// Total number of bits
    bit_count: usize,

    /// Probes (i.e. bits checked) per lookup
    probes: usize,
}

impl BloomFilter {
    /// Builds a filter over the given keys with `bpk` bits per key.
    ///
    /// 10 bits per key is a sensible default.
    ///
    /// Returns `None` if there are no keys or `bpk` is zero.
    #[must_use]
    pub fn from_keys<'a, I: IntoIterator<Item = &'a [u8]>>(keys: I, n: usize, bpk: u8) -> Option<Self> {
        if n == 0 || bpk == 0 {
            return None;
        }

        // Budget n * bpk bits, padded to whole bytes. The probe count
        // minimizing the false positive rate for that budget is bpk * ln 2,
        // approximated here in integer math.
        let bytes = (n * usize::from(bpk)).div_ceil(8);
        let probes = (usize::from(bpk) * 693 / 1_000).max(1);

        let mut filter = Self {
            bits: BitArray::with_capacity(bytes),
            bit_count: bytes * 8,
            probes,
        };

        for key in keys {
            filter.set(key);
        }

        Some(filter)
    }

    /// Returns the size of the bloom filter in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the filter has no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of probes per lookup.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    /// Returns `true` if the key may be contained.
    ///
    /// Will never have a false negative.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        Self::slots(self.bit_count, self.probes, key).all(|slot| self.bits.get(slot))
    }

    /// Enables every probe slot of the key.
    fn set(&mut self, key: &[u8]) {
        // NOTE: The iterator captures plain numbers, not the filter itself
        for slot in Self::slots(self.bit_count, self.probes, key) {
            self.bits.enable(slot);
        }
    }

    /// Derives the probe slots of a key.
    ///
    /// The digest's high half anchors the sequence and the low half strides
    /// it, so lookups and inserts agree on every slot.
    #[allow(clippy::cast_possible_truncation)]
    fn slots(bit_count: usize, probes: usize, key: &[u8]) -> impl Iterator<Item = usize> {
        let digest = xxhash_rust::xxh3::xxh3_128(key);
        let anchor = (digest >> 64) as u64;
        let stride = digest as u64;

        (0..probes as u64).map(move |round| {
            let slot = anchor.wrapping_add(stride.wrapping_mul(round)) % (bit_count as u64);

            // NOTE: In bounds, the modulus is the bit count
            slot as usize
        })
    }
}
