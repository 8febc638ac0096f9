// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub mod checkpoint;
pub mod cursor;
pub mod live;

use crate::bloom::BloomFilter;
use crate::value::{UserKey, UserValue};
use crate::{Error, Result};
use checkpoint::Checkpoint;
use cursor::{CheckpointCursor, ChunkCursor, LiveCursor};
use live::LiveStore;
use std::sync::{
    atomic::{
        AtomicBool, AtomicU32, AtomicU64,
        Ordering::{AcqRel, Acquire, Relaxed, Release},
    },
    Arc, RwLock,
};

/// Chunk identifier, unique within its tree
pub type ChunkId = u64;

/// One ordered map participating in the LSM layering
///
/// A chunk starts out live (receiving writes through its skip-list store) and
/// is sealed by a chunk switch, which freezes its contents into a checkpoint
/// snapshot and builds its Bloom filter. Cursors over a sealed chunk read the
/// snapshot; cursors over a live chunk read the store.
pub struct Chunk {
    uri: String,

    bloom_uri: Option<String>,

    live: Arc<LiveStore>,

    sealed: AtomicBool,

    checkpoint: RwLock<Option<Arc<Checkpoint>>>,

    bloom: RwLock<Option<Arc<BloomFilter>>>,

    /// Number of cursors attached to this chunk as their primary.
    ///
    /// A chunk with attached cursors must not be retired.
    ncursor: AtomicU32,

    /// Approximate entry count.
    ///
    /// Maintained without synchronization; it only feeds sizing heuristics.
    count: AtomicU64,
}

impl Chunk {
    pub fn new(tree_name: &str, id: ChunkId, bloom_enabled: bool) -> Self {
        let base = tree_name.strip_prefix("lsm:").unwrap_or(tree_name);

        Self {
            uri: format!("file:{base}-{id:06}.lsm"),
            bloom_uri: bloom_enabled.then(|| format!("file:{base}-{id:06}.bf")),
            live: Arc::new(LiveStore::new()),
            sealed: AtomicBool::new(false),
            checkpoint: RwLock::new(None),
            bloom: RwLock::new(None),
            ncursor: AtomicU32::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Acquire)
    }

    /// Freezes the live contents into a checkpoint snapshot and builds the
    /// Bloom filter over it.
    ///
    /// Empty chunks get an empty snapshot and no filter.
    pub fn seal(&self, bloom_bits_per_key: u8) {
        let items = self.live.snapshot();

        log::trace!(
            "sealing chunk {} ({} items, ~{}B)",
            self.uri,
            items.len(),
            self.live.size(),
        );

        if self.bloom_uri.is_some() {
            let filter =
                BloomFilter::from_keys(items.iter().map(|(k, _)| &**k), items.len(), bloom_bits_per_key);

            #[expect(clippy::expect_used, reason = "lock is poisoned")]
            let mut bloom = self.bloom.write().expect("lock is poisoned");
            *bloom = filter.map(Arc::new);
        }

        {
            #[expect(clippy::expect_used, reason = "lock is poisoned")]
            let mut checkpoint = self.checkpoint.write().expect("lock is poisoned");
            *checkpoint = Some(Arc::new(Checkpoint::new(items)));
        }

        self.sealed.store(true, Release);
    }

    /// Opens a cursor over this chunk: the checkpoint snapshot if the chunk
    /// is sealed, the live store otherwise.
    pub fn cursor(&self) -> Result<ChunkCursor> {
        if self.is_sealed() {
            #[expect(clippy::expect_used, reason = "lock is poisoned")]
            let checkpoint = self.checkpoint.read().expect("lock is poisoned");

            let Some(data) = checkpoint.clone() else {
                return Err(Error::ChunkOpen("sealed chunk has no checkpoint"));
            };

            Ok(ChunkCursor::from(CheckpointCursor::new(data)))
        } else {
            Ok(ChunkCursor::from(LiveCursor::new(self.live.clone())))
        }
    }

    /// The chunk's Bloom filter, if one has been built.
    pub fn bloom(&self) -> Option<Arc<BloomFilter>> {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let bloom = self.bloom.read().expect("lock is poisoned");
        bloom.clone()
    }

    /// Writes an item into the live store.
    pub fn insert(&self, key: UserKey, value: UserValue) {
        self.live.insert(key, value);
    }

    /// Bumps the approximate entry count.
    pub fn bump_count(&self) {
        self.count.fetch_add(1, Relaxed);
    }

    /// Approximate entry count.
    pub fn count(&self) -> u64 {
        self.count.load(Relaxed)
    }

    /// Handle to the live store's approximate size counter.
    pub fn size_handle(&self) -> Arc<AtomicU64> {
        self.live.size_handle()
    }

    /// Attaches a cursor (the chunk is somebody's primary).
    pub fn retain_cursor(&self) {
        self.ncursor.fetch_add(1, AcqRel);
    }

    /// Detaches a cursor.
    pub fn release_cursor(&self) {
        let prev = self.ncursor.fetch_sub(1, AcqRel);
        debug_assert!(prev > 0, "cursor refcount underflow");
    }

    /// Number of cursors attached to this chunk.
    pub fn cursor_count(&self) -> u32 {
        self.ncursor.load(Acquire)
    }
}
