// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::Cursor;
use crate::chunk::cursor::CursorOps;
use crate::value::{is_tombstone, UserKey};
use crate::Error;
use std::cmp::Ordering;

impl Cursor {
    /// Positions the cursor at the staged key.
    ///
    /// Chunks are probed newest to oldest, so a newer version (or deletion)
    /// of the key shadows older ones without further lookups; sealed chunks
    /// are skipped entirely when their Bloom filter rules the key out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key does not exist (or its newest
    /// version is a deletion), [`Error::InvalidArgument`] if no key is
    /// staged.
    pub fn search(&mut self) -> crate::Result<()> {
        self.enter()?;

        let key = self.key.clone().ok_or_else(Error::key_not_set)?;
        self.lookup(&key)
    }

    /// Point lookup across all chunks, newest first.
    ///
    /// On success the found item is materialized and the owning chunk's
    /// cursor selected; on failure the cursor's key/value are cleared.
    pub(crate) fn lookup(&mut self, key: &UserKey) -> crate::Result<()> {
        for idx in (0..self.cursors.len()).rev() {
            // If there is a Bloom filter, see if we can skip the read.
            if let Some(Some(bloom)) = self.blooms.get(idx) {
                if !bloom.contains(key) {
                    continue;
                }
            }

            let Some(cursor) = self.cursors.get_mut(idx) else {
                continue;
            };

            if !cursor.search(key) {
                continue;
            }

            let value = cursor.value().cloned();
            self.current = Some(idx);

            #[expect(clippy::expect_used, reason = "the cursor hit, so it is positioned")]
            let value = value.expect("cursor should be positioned");

            if is_tombstone(&value) {
                self.key = None;
                self.value = None;
                return Err(Error::NotFound);
            }

            self.key = Some(key.clone());
            self.value = Some(value);
            return Ok(());
        }

        self.key = None;
        self.value = None;
        Err(Error::NotFound)
    }

    /// Positions the cursor at the key closest to the staged key.
    ///
    /// A nearby key in the newest chunk is not good enough; a closer key may
    /// live in any other chunk, so every chunk nominates its nearest
    /// non-deleted candidate and the best one wins. Candidates landing on a
    /// deletion hop forward, then backward, until a live item is found.
    ///
    /// Returns how the landed key compares against the staged key
    /// ([`Ordering::Equal`] for an exact match). Between a smaller and a
    /// larger candidate, the smaller one is preferred.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no chunk has any live item,
    /// [`Error::InvalidArgument`] if no key is staged.
    pub fn search_near(&mut self) -> crate::Result<Ordering> {
        self.enter()?;

        let key = self.key.clone().ok_or_else(Error::key_not_set)?;

        // Smallest candidate above the key, and largest below it
        let mut larger: Option<(usize, UserKey)> = None;
        let mut smaller: Option<(usize, UserKey)> = None;

        for idx in (0..self.cursors.len()).rev() {
            let Some(cursor) = self.cursors.get_mut(idx) else {
                continue;
            };

            let Some(mut cmp) = cursor.search_near(&key) else {
                continue;
            };

            let mut deleted = cursor.value().is_some_and(|value| is_tombstone(value));

            if cmp == Ordering::Equal && !deleted {
                // An exact live match beats any nearby candidate.
                let found = cursor.key().cloned();
                let value = cursor.value().cloned();
                self.current = Some(idx);
                self.key = found;
                self.value = value;
                return Ok(Ordering::Equal);
            }

            // If we landed on a deleted item, try going forwards, then
            // backwards, to find one that isn't deleted.
            while deleted && cursor.next() {
                cmp = Ordering::Greater;
                deleted = cursor.value().is_some_and(|value| is_tombstone(value));
            }
            while deleted && cursor.prev() {
                cmp = Ordering::Less;
                deleted = cursor.value().is_some_and(|value| is_tombstone(value));
            }
            if deleted {
                continue;
            }

            let Some(landed) = cursor.key().cloned() else {
                continue;
            };

            if cmp == Ordering::Greater {
                match &larger {
                    Some((_, best)) if self.tree.compare_keys(&landed, best) != Ordering::Less => {}
                    _ => larger = Some((idx, landed)),
                }
            } else {
                match &smaller {
                    Some((_, best))
                        if self.tree.compare_keys(&landed, best) != Ordering::Greater => {}
                    _ => smaller = Some((idx, landed)),
                }
            }
        }

        let (idx, exact) = if let Some((idx, _)) = smaller {
            (idx, Ordering::Less)
        } else if let Some((idx, _)) = larger {
            (idx, Ordering::Greater)
        } else {
            self.key = None;
            self.value = None;
            return Err(Error::NotFound);
        };

        self.current = Some(idx);

        let item = self
            .cursors
            .get(idx)
            .and_then(|cursor| cursor.key().cloned().zip(cursor.value().cloned()));

        #[expect(clippy::expect_used, reason = "the candidate cursor is positioned")]
        let (found, value) = item.expect("candidate cursor should be positioned");

        self.key = Some(found);
        self.value = Some(value);

        Ok(exact)
    }
}
