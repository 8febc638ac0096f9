// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub(crate) mod inner;

use crate::chunk::Chunk;
use crate::config::Config;
use crate::store::SchemaLock;
use inner::TreeInner;
use std::sync::{
    atomic::Ordering::{AcqRel, Relaxed},
    Arc, MutexGuard,
};

/// A chunk-based log-structured merge tree
///
/// An ordered list of chunks, oldest to newest; the last chunk (the
/// *primary*) is live in memory and receives all writes. Cloning is cheap
/// and clones refer to the same tree.
#[derive(Clone)]
pub struct Tree(Arc<TreeInner>);

impl std::ops::Deref for Tree {
    type Target = TreeInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Tree {
    pub(crate) fn create(name: &str, config: Config) -> Self {
        log::debug!("creating tree {name}");
        Self(Arc::new(TreeInner::create_new(name, config)))
    }

    /// The tree's URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.name
    }

    /// Number of chunks currently in the tree.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.lock_chunks().chunks().len()
    }

    /// The current chunk-list generation.
    #[doc(hidden)]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.0.generation()
    }

    /// Per-chunk cursor attachment counts, oldest chunk first.
    #[doc(hidden)]
    #[must_use]
    pub fn cursor_ref_counts(&self) -> Vec<u32> {
        self.lock_chunks()
            .chunks()
            .iter()
            .map(|chunk| chunk.cursor_count())
            .collect()
    }

    /// Approximate number of entries written, summed over all chunks.
    #[doc(hidden)]
    #[must_use]
    pub fn approximate_count(&self) -> u64 {
        self.lock_chunks()
            .chunks()
            .iter()
            .map(|chunk| chunk.count())
            .sum()
    }

    /// Acquires the tree lock.
    pub(crate) fn lock_chunks(&self) -> ChunkListGuard<'_> {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let chunks = self.0.chunks.lock().expect("lock is poisoned");

        ChunkListGuard {
            inner: &self.0,
            chunks,
        }
    }

    pub(crate) fn threshold(&self) -> u64 {
        self.config.threshold
    }
}

/// Exclusive view of the chunk list, i.e. the held tree lock
///
/// The chunk switch is only reachable through this guard and acquires the
/// schema lock itself, which pins the lock order to tree before schema;
/// the reverse order cannot be written.
pub(crate) struct ChunkListGuard<'a> {
    inner: &'a TreeInner,
    chunks: MutexGuard<'a, Vec<Arc<Chunk>>>,
}

impl ChunkListGuard<'_> {
    pub(crate) fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub(crate) fn generation(&self) -> u64 {
        self.inner.generation()
    }

    /// Rolls the primary chunk over: seals it (checkpoint snapshot plus
    /// Bloom filter) and installs a fresh live chunk, bumping `dsk_gen`.
    ///
    /// The memsize hint is cleared so the next cursor sync re-establishes it
    /// against the new primary.
    pub(crate) fn switch(&mut self, schema: &SchemaLock) -> crate::Result<()> {
        let _schema = schema.acquire();

        if let Some(primary) = self.chunks.last() {
            primary.seal(self.inner.config.bloom_bits_per_key);
        }

        let id = self.inner.chunk_counter.fetch_add(1, Relaxed);
        let chunk = Arc::new(Chunk::new(
            &self.inner.name,
            id,
            self.inner.config.bloom_bits_per_key > 0,
        ));

        log::debug!(
            "chunk switch on {}: installing {} (chunk #{})",
            self.inner.name,
            chunk.uri(),
            self.chunks.len() + 1,
        );

        self.chunks.push(chunk);
        self.inner.clear_memsize_hint();
        self.inner.dsk_gen.fetch_add(1, AcqRel);

        Ok(())
    }

    /// Establishes the memsize hint from the given primary if unset.
    pub(crate) fn ensure_memsize_hint(&self, primary: &Chunk) {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let mut hint = self.inner.memsize.write().expect("lock is poisoned");

        if hint.is_none() {
            *hint = Some(primary.size_handle());
        }
    }
}
