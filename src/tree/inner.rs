// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::chunk::Chunk;
use crate::config::Config;
use std::cmp::Ordering;
use std::sync::{
    atomic::{AtomicU64, Ordering::Acquire},
    Arc, Mutex, RwLock,
};

pub struct TreeInner {
    /// Full tree URI (`lsm:` prefixed)
    pub(crate) name: Arc<str>,

    /// Tree configuration
    pub(crate) config: Config,

    /// Identifies the current shape of the chunk list.
    ///
    /// Strictly monotonic; cursors compare their observed value against it
    /// on operation entry to detect topology changes. Starts at 1 so fresh
    /// cursors (observing 0) always synchronize on first use.
    pub(crate) dsk_gen: AtomicU64,

    /// Next chunk id
    pub(crate) chunk_counter: AtomicU64,

    /// The chunk list, oldest first; the last chunk is the primary.
    ///
    /// The mutex is the tree lock: all structural changes happen under it.
    pub(crate) chunks: Mutex<Vec<Arc<Chunk>>>,

    /// Cached handle to the primary chunk's approximate in-memory size.
    ///
    /// Cleared on rollover and re-established by the next cursor sync, so
    /// the write path can check the threshold without taking the tree lock.
    pub(crate) memsize: RwLock<Option<Arc<AtomicU64>>>,
}

impl TreeInner {
    pub(crate) fn create_new(name: &str, config: Config) -> Self {
        let first = Arc::new(Chunk::new(name, 1, config.bloom_bits_per_key > 0));

        Self {
            name: name.into(),
            config,
            dsk_gen: AtomicU64::new(1),
            chunk_counter: AtomicU64::new(2),
            chunks: Mutex::new(vec![first]),
            memsize: RwLock::new(None),
        }
    }

    /// Compares two user keys with the tree comparator, bytewise without one.
    pub(crate) fn compare_keys(&self, a: &[u8], b: &[u8]) -> Ordering {
        match &self.config.comparator {
            Some(comparator) => comparator.compare(a, b),
            None => a.cmp(b),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.dsk_gen.load(Acquire)
    }

    pub(crate) fn memsize_hint(&self) -> Option<Arc<AtomicU64>> {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let hint = self.memsize.read().expect("lock is poisoned");
        hint.clone()
    }

    pub(crate) fn clear_memsize_hint(&self) {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let mut hint = self.memsize.write().expect("lock is poisoned");
        *hint = None;
    }
}

impl Drop for TreeInner {
    fn drop(&mut self) {
        log::trace!("dropping tree {}", self.name);
    }
}
