// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{checkpoint::Checkpoint, live::LiveStore};
use crate::value::{KvPair, UserKey, UserValue};
use enum_dispatch::enum_dispatch;
use std::cmp::Ordering;
use std::sync::Arc;

/// Capability set of a per-chunk cursor
///
/// A cursor is positioned or unpositioned. Navigation from an unpositioned
/// cursor starts at the corresponding end of the chunk, which is what the
/// tombstone-hopping in nearest-match lookups relies on.
#[enum_dispatch]
pub trait CursorOps {
    /// Clears the position.
    fn reset(&mut self);

    /// Moves to the next item, or the first if unpositioned.
    ///
    /// Returns `false` (and unpositions) when exhausted.
    fn next(&mut self) -> bool;

    /// Moves to the previous item, or the last if unpositioned.
    ///
    /// Returns `false` (and unpositions) when exhausted.
    fn prev(&mut self) -> bool;

    /// Positions at `key` exactly; `false` (and unpositions) on miss.
    fn search(&mut self, key: &[u8]) -> bool;

    /// Positions at the nearest item, preferring the lowest item not below
    /// `key`, falling back to the highest item below it.
    ///
    /// Returns how the landed key compares against `key`, or `None` (and
    /// unpositions) if the chunk is empty.
    fn search_near(&mut self, key: &[u8]) -> Option<Ordering>;

    /// Key at the current position.
    fn key(&self) -> Option<&UserKey>;

    /// Value at the current position.
    fn value(&self) -> Option<&UserValue>;
}

/// Cursor over one chunk, with a variant per chunk state
#[enum_dispatch(CursorOps)]
pub enum ChunkCursor {
    /// Cursor over the live in-memory store
    Live(LiveCursor),

    /// Cursor over a sealed chunk's checkpoint snapshot
    Checkpoint(CheckpointCursor),
}

/// Cursor over the live skip-list store
///
/// Positions are tracked by owned key, so concurrent writes to the store
/// never invalidate a position; navigation is a bounded skip-list lookup.
pub struct LiveCursor {
    store: Arc<LiveStore>,
    pos: Option<KvPair>,
}

impl LiveCursor {
    pub fn new(store: Arc<LiveStore>) -> Self {
        Self { store, pos: None }
    }
}

impl CursorOps for LiveCursor {
    fn reset(&mut self) {
        self.pos = None;
    }

    fn next(&mut self) -> bool {
        self.pos = match &self.pos {
            Some((key, _)) => self.store.next_after(key),
            None => self.store.first(),
        };
        self.pos.is_some()
    }

    fn prev(&mut self) -> bool {
        self.pos = match &self.pos {
            Some((key, _)) => self.store.prev_before(key),
            None => self.store.last(),
        };
        self.pos.is_some()
    }

    fn search(&mut self, key: &[u8]) -> bool {
        self.pos = self.store.get(key);
        self.pos.is_some()
    }

    fn search_near(&mut self, key: &[u8]) -> Option<Ordering> {
        if let Some((landed, value)) = self.store.lower_bound(key) {
            let cmp = if &*landed == key {
                Ordering::Equal
            } else {
                Ordering::Greater
            };
            self.pos = Some((landed, value));
            return Some(cmp);
        }

        self.pos = self.store.prev_before(key);
        self.pos.as_ref().map(|_| Ordering::Less)
    }

    fn key(&self) -> Option<&UserKey> {
        self.pos.as_ref().map(|(k, _)| k)
    }

    fn value(&self) -> Option<&UserValue> {
        self.pos.as_ref().map(|(_, v)| v)
    }
}

/// Cursor over an immutable checkpoint snapshot
pub struct CheckpointCursor {
    data: Arc<Checkpoint>,
    pos: Option<usize>,
}

impl CheckpointCursor {
    pub fn new(data: Arc<Checkpoint>) -> Self {
        Self { data, pos: None }
    }

    fn item(&self) -> Option<&KvPair> {
        self.pos.and_then(|idx| self.data.get(idx))
    }
}

impl CursorOps for CheckpointCursor {
    fn reset(&mut self) {
        self.pos = None;
    }

    fn next(&mut self) -> bool {
        self.pos = match self.pos {
            Some(idx) => idx.checked_add(1).filter(|next| *next < self.data.len()),
            None if self.data.is_empty() => None,
            None => Some(0),
        };
        self.pos.is_some()
    }

    fn prev(&mut self) -> bool {
        self.pos = match self.pos {
            Some(idx) => idx.checked_sub(1),
            None => self.data.len().checked_sub(1),
        };
        self.pos.is_some()
    }

    fn search(&mut self, key: &[u8]) -> bool {
        let idx = self.data.lower_bound(key);
        self.pos = self
            .data
            .get(idx)
            .filter(|(landed, _)| &**landed == key)
            .map(|_| idx);
        self.pos.is_some()
    }

    fn search_near(&mut self, key: &[u8]) -> Option<Ordering> {
        let idx = self.data.lower_bound(key);

        if let Some((landed, _)) = self.data.get(idx) {
            self.pos = Some(idx);
            return Some(if &**landed == key {
                Ordering::Equal
            } else {
                Ordering::Greater
            });
        }

        self.pos = idx.checked_sub(1);
        self.pos.map(|_| Ordering::Less)
    }

    fn key(&self) -> Option<&UserKey> {
        self.item().map(|(k, _)| k)
    }

    fn value(&self) -> Option<&UserValue> {
        self.item().map(|(_, v)| v)
    }
}
