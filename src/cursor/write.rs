// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::Cursor;
use crate::chunk::cursor::CursorOps;
use crate::value::{is_tombstone, tombstone, UserKey, UserValue};
use crate::Error;
use std::sync::atomic::Ordering::Acquire;

impl Cursor {
    /// Writes the staged key/value pair.
    ///
    /// In overwrite mode (the default) an existing key is replaced. With
    /// overwrite off, an existing key fails the insert instead.
    ///
    /// The empty value is reserved as the deletion marker and is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] when overwrite is off and the key
    /// exists, [`Error::ValueNotSet`] for an empty value,
    /// [`Error::InvalidArgument`] if key or value are unstaged.
    pub fn insert(&mut self) -> crate::Result<()> {
        self.enter()?;

        let key = self.key.clone().ok_or_else(Error::key_not_set)?;
        let value = self.needvalue()?;

        if !self.overwrite {
            match self.lookup(&key) {
                Ok(()) => return Err(Error::DuplicateKey),
                Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
        }

        self.put(&key, &value)?;

        self.key = Some(key);
        self.value = Some(value);
        Ok(())
    }

    /// Replaces the value of the staged key.
    ///
    /// In overwrite mode this behaves like [`Cursor::insert`]; with
    /// overwrite off the key must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when overwrite is off and the key does
    /// not exist, [`Error::ValueNotSet`] for an empty value,
    /// [`Error::InvalidArgument`] if key or value are unstaged.
    pub fn update(&mut self) -> crate::Result<()> {
        self.enter()?;

        let key = self.key.clone().ok_or_else(Error::key_not_set)?;
        let value = self.needvalue()?;

        if !self.overwrite {
            self.lookup(&key)?;
        }

        self.put(&key, &value)?;

        self.key = Some(key);
        self.value = Some(value);
        Ok(())
    }

    /// Deletes the staged key by writing a tombstone into the primary
    /// chunk, masking any older version of the key.
    ///
    /// With overwrite off the key must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when overwrite is off and the key does
    /// not exist, [`Error::InvalidArgument`] if no key is staged.
    pub fn remove(&mut self) -> crate::Result<()> {
        self.enter()?;

        let key = self.key.clone().ok_or_else(Error::key_not_set)?;

        if !self.overwrite {
            self.lookup(&key)?;
        }

        self.put(&key, &tombstone())?;

        // The position now sits on a deletion, which is never surfaced.
        self.key = Some(key);
        self.value = None;
        Ok(())
    }

    /// The staged value; rejects the reserved empty value.
    fn needvalue(&self) -> crate::Result<UserValue> {
        let value = self.value.clone().ok_or_else(Error::value_not_set)?;

        if is_tombstone(&value) {
            return Err(Error::ValueNotSet);
        }

        Ok(value)
    }

    /// Writes an entry into the primary chunk, rolling the chunk over when
    /// needed.
    ///
    /// The first write through a cursor switches to a fresh primary chunk
    /// (unless another thread already moved the tree along) and then
    /// re-synchronizes exactly once; if yet another switch lands in
    /// between, the write still goes to the primary observed by that sync.
    ///
    /// After the write, the primary's size is checked against the tree
    /// threshold. To trigger a rollover, the memory hold on the primary is
    /// released first and the tree lock taken *before* the schema lock; the
    /// reverse order would deadlock.
    fn put(&mut self, key: &UserKey, value: &UserValue) -> crate::Result<()> {
        // If this is the first update in this cursor, get a fresh primary
        // chunk to write into.
        if !self.updated {
            {
                let mut guard = self.tree.lock_chunks();
                if self.dsk_gen == guard.generation() {
                    guard.switch(self.store.schema_lock())?;
                }
            }
            self.updated = true;

            // We changed the structure, or someone else did: update.
            self.open_cursors()?;
        }

        let Some(primary_idx) = self.cursors.len().checked_sub(1) else {
            return Err(Error::ChunkOpen("tree has no primary chunk"));
        };

        let Some(primary) = self.chunks.last().cloned() else {
            return Err(Error::ChunkOpen("tree has no primary chunk"));
        };

        primary.insert(key.clone(), value.clone());

        // The count is shared, but only approximate, so no synchronization.
        primary.bump_count();

        // Set the position for future scans. If we were positioned in a
        // non-primary chunk before, multiple cursors may now match the key.
        self.iterating = None;
        if let Some(cursor) = self.cursors.get_mut(primary_idx) {
            let found = cursor.search(key);
            debug_assert!(found, "own write should be visible in the primary");
        }
        self.current = Some(primary_idx);

        if let Some(memsize) = self.tree.memsize_hint() {
            if memsize.load(Acquire) > self.tree.threshold() {
                // Let go of the primary's size hold before locking.
                self.tree.clear_memsize_hint();

                // Take the tree lock first: acquiring it while holding the
                // schema lock deadlocks.
                let mut guard = self.tree.lock_chunks();

                // Make sure we don't race.
                if self.dsk_gen == guard.generation() {
                    guard.switch(self.store.schema_lock())?;
                }
            }
        }

        Ok(())
    }
}
