// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod iter;
mod search;
mod write;

use crate::bloom::BloomFilter;
use crate::chunk::{
    cursor::{ChunkCursor, CursorOps},
    Chunk,
};
use crate::value::{UserKey, UserValue};
use crate::{Error, Store, Tree};
use std::cmp::Ordering;
use std::sync::Arc;

/// Iteration direction the cursor is primed for
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Forward,
    Reverse,
}

/// Options for opening a cursor
#[derive(Copy, Clone, Debug)]
pub struct CursorOptions {
    pub(crate) overwrite: bool,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

impl CursorOptions {
    /// Initializes default options (overwrite mode on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls overwrite mode.
    ///
    /// With overwrite off, [`Cursor::insert`] fails with
    /// [`Error::DuplicateKey`] if the key exists, and [`Cursor::update`] /
    /// [`Cursor::remove`] fail with [`Error::NotFound`] if it does not.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// A cursor presenting one ordered key/value view over all chunks of a tree
///
/// The cursor owns one per-chunk cursor (and Bloom filter handle) per chunk
/// of the tree as of its last synchronization. Whenever the tree's chunk
/// list changes shape, the next operation tears the per-chunk cursors down
/// and reopens them against the new topology, carrying the cursor's key
/// across so iteration can resume where it left off.
///
/// A cursor is owned by a single thread of control; concurrency happens
/// between cursors attached to the same tree.
pub struct Cursor {
    pub(crate) store: Store,
    pub(crate) tree: Tree,

    /// Observed chunk list, oldest first; indices align with `cursors` and
    /// `blooms`.
    pub(crate) chunks: Vec<Arc<Chunk>>,

    pub(crate) cursors: Vec<ChunkCursor>,

    pub(crate) blooms: Vec<Option<Arc<BloomFilter>>>,

    /// Index of the selected per-chunk cursor
    pub(crate) current: Option<usize>,

    /// Cursor-owned copy of the key, surviving re-synchronization
    pub(crate) key: Option<UserKey>,

    pub(crate) value: Option<UserValue>,

    /// Chunk-list generation this cursor last synchronized against
    pub(crate) dsk_gen: u64,

    /// The chunk this cursor holds an `ncursor` reference on
    pub(crate) primary: Option<Arc<Chunk>>,

    /// Whether this cursor has written before (the first write switches
    /// the primary chunk)
    pub(crate) updated: bool,

    pub(crate) iterating: Option<Direction>,

    /// Two or more per-chunk cursors sit on the current key
    pub(crate) multiple: bool,

    /// Merge cursors pin their chunk count and never re-synchronize
    pub(crate) merge: bool,

    pub(crate) merge_chunks: usize,

    pub(crate) overwrite: bool,
}

impl Cursor {
    pub(crate) fn new(store: Store, tree: Tree, options: CursorOptions) -> Self {
        Self {
            store,
            tree,
            chunks: Vec::new(),
            cursors: Vec::new(),
            blooms: Vec::new(),
            current: None,
            key: None,
            value: None,
            // The tree's generation starts at 1, so the first operation
            // always goes through the open-cursors path.
            dsk_gen: 0,
            primary: None,
            updated: false,
            iterating: None,
            multiple: false,
            merge: false,
            merge_chunks: 0,
            overwrite: options.overwrite,
        }
    }

    /// Stages the key for the next operation.
    pub fn set_key<K: Into<UserKey>>(&mut self, key: K) {
        self.key = Some(key.into());
    }

    /// Stages the value for the next write.
    pub fn set_value<V: Into<UserValue>>(&mut self, value: V) {
        self.value = Some(value.into());
    }

    /// Key at the current position (or as staged), if set.
    #[must_use]
    pub fn key(&self) -> Option<&UserKey> {
        self.key.as_ref()
    }

    /// Value at the current position (or as staged), if set.
    #[must_use]
    pub fn value(&self) -> Option<&UserValue> {
        self.value.as_ref()
    }

    /// Synchronizes with the tree if its chunk list changed shape.
    pub(crate) fn enter(&mut self) -> crate::Result<()> {
        if !self.merge && self.dsk_gen != self.tree.generation() {
            self.open_cursors()?;
        }
        Ok(())
    }

    /// Closes all per-chunk cursors and detaches from the primary chunk.
    pub(crate) fn close_cursors(&mut self) {
        if let Some(primary) = self.primary.take() {
            primary.release_cursor();
        }

        self.cursors.clear();
        self.blooms.clear();
        self.chunks.clear();
        self.current = None;
    }

    /// Opens per-chunk cursors for the tree's current set of chunks.
    ///
    /// The cursor-owned key keeps any position valid across the swap; the
    /// iterate state is reset so the next `next`/`prev` re-seeds from it.
    ///
    /// On failure the tree lock is released, the cursor is left detached
    /// (`current` unset, generation unchanged) and the next operation
    /// starts over.
    pub(crate) fn open_cursors(&mut self) -> crate::Result<()> {
        if self.key.is_some() {
            self.iterating = None;
        }

        self.close_cursors();

        let guard = self.tree.lock_chunks();

        // Merge cursors have already decided how many chunks they need.
        let nchunks = if self.merge {
            self.merge_chunks
        } else {
            guard.chunks().len()
        };

        log::trace!(
            "opening {nchunks} chunk cursors on {} (gen {})",
            self.tree.uri(),
            guard.generation(),
        );

        for idx in 0..nchunks {
            let Some(chunk) = guard.chunks().get(idx).cloned() else {
                return Err(Error::ChunkOpen("chunk list is shorter than the pinned count"));
            };

            let cursor = chunk.cursor()?;

            let bloom = if self.merge { None } else { chunk.bloom() };

            self.cursors.push(cursor);
            self.blooms.push(bloom);
            self.chunks.push(chunk);
        }

        // The last chunk is our new primary.
        if let Some(primary) = self.chunks.last().cloned() {
            debug_assert!(
                !(self.updated && primary.is_sealed()),
                "a writing cursor's primary must be live",
            );

            primary.retain_cursor();
            guard.ensure_memsize_hint(&primary);
            self.primary = Some(primary);
        }

        self.dsk_gen = guard.generation();

        Ok(())
    }

    /// Pins the cursor to the tree's oldest `nchunks` chunks for merging.
    ///
    /// Merge cursors skip Bloom filters and never re-synchronize, so the
    /// caller must pin the tree topology for the cursor's lifetime; the
    /// count is not validated beyond the chunk list being long enough at
    /// open time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a zero count, or
    /// [`Error::ChunkOpen`] if the tree has fewer chunks.
    #[doc(hidden)]
    pub fn init_merge(&mut self, nchunks: usize) -> crate::Result<()> {
        if nchunks == 0 {
            return Err(Error::InvalidArgument("merge needs at least one chunk"));
        }

        self.merge = true;
        self.merge_chunks = nchunks;

        self.open_cursors()
    }

    /// Clears the cursor's position.
    ///
    /// # Errors
    ///
    /// Returns an error if re-synchronization fails.
    pub fn reset(&mut self) -> crate::Result<()> {
        self.enter()?;

        if let Some(idx) = self.current.take() {
            if let Some(cursor) = self.cursors.get_mut(idx) {
                cursor.reset();
            }
        }

        self.key = None;
        self.value = None;
        self.iterating = None;

        Ok(())
    }

    /// Compares this cursor's key against another cursor's.
    ///
    /// Does not synchronize with the tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the cursors reference
    /// different trees or either key is unset.
    pub fn compare(&self, other: &Self) -> crate::Result<Ordering> {
        if self.tree.uri() != other.tree.uri() {
            return Err(Error::InvalidArgument(
                "compared cursors must reference the same tree",
            ));
        }

        let a = self.key.as_ref().ok_or_else(Error::key_not_set)?;
        let b = other.key.as_ref().ok_or_else(Error::key_not_set)?;

        Ok(self.tree.compare_keys(a, b))
    }

    /// Closes the cursor, detaching it from the tree.
    ///
    /// Dropping the cursor does the same.
    pub fn close(self) {
        // Drop handles the teardown
    }

    pub(crate) fn compare_current_keys(&self, a: usize, b: usize) -> Option<Ordering> {
        let a = self.cursors.get(a).and_then(CursorOps::key)?;
        let b = self.cursors.get(b).and_then(CursorOps::key)?;
        Some(self.tree.compare_keys(a, b))
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close_cursors();
    }
}
