// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::comparator::Comparator;
use std::sync::Arc;

/// Default primary-chunk rollover threshold (4 MiB)
const DEFAULT_THRESHOLD: u64 = 4 * 1_024 * 1_024;

/// Default Bloom filter size (10 bits per key)
const DEFAULT_BLOOM_BPK: u8 = 10;

/// Tree configuration
#[derive(Clone)]
pub struct Config {
    /// Approximate in-memory size (in bytes) at which the primary chunk is
    /// rolled over by the write path.
    pub(crate) threshold: u64,

    /// Bits per key for the Bloom filters built when chunks are sealed.
    ///
    /// 0 disables Bloom filters.
    pub(crate) bloom_bits_per_key: u8,

    /// User key ordering; bytewise if unset.
    pub(crate) comparator: Option<Arc<dyn Comparator>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            bloom_bits_per_key: DEFAULT_BLOOM_BPK,
            comparator: None,
        }
    }
}

impl Config {
    /// Initializes a new config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary-chunk rollover threshold in bytes.
    ///
    /// Once the primary chunk's approximate in-memory size exceeds this,
    /// the next write seals it and installs a fresh primary.
    #[must_use]
    pub fn threshold(mut self, bytes: u64) -> Self {
        self.threshold = bytes;
        self
    }

    /// Sets the Bloom filter size in bits per key (0 disables filters).
    #[must_use]
    pub fn bloom_bits_per_key(mut self, bits: u8) -> Self {
        self.bloom_bits_per_key = bits;
        self
    }

    /// Sets the user key comparator.
    ///
    /// Drives cross-chunk arbitration and [`Cursor::compare`](crate::Cursor::compare).
    /// The bundled chunk store orders bytewise, so a custom comparator
    /// requires a chunk store honoring the same order.
    #[must_use]
    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }
}
