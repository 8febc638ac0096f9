// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{Cursor, Direction};
use crate::chunk::cursor::CursorOps;
use crate::value::is_tombstone;
use crate::Error;
use std::cmp::Ordering;

impl Cursor {
    /// Moves to the next item in key order.
    ///
    /// From a fresh or reset cursor this starts at the first key; from a
    /// staged key it starts at the first key after it. Deleted items are
    /// never returned; a key present in several chunks is returned once,
    /// with the newest chunk's value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] once exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> crate::Result<()> {
        self.enter()?;
        self.advance(Direction::Forward)
    }

    /// Moves to the previous item in key order.
    ///
    /// The reverse counterpart of [`Cursor::next`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] once exhausted.
    pub fn prev(&mut self) -> crate::Result<()> {
        self.enter()?;
        self.advance(Direction::Reverse)
    }

    fn advance(&mut self, direction: Direction) -> crate::Result<()> {
        // If we aren't positioned for a scan in this direction, get started.
        let mut positioned = if self.current.is_some() && self.iterating == Some(direction) {
            true
        } else {
            self.seed(direction);
            // A cursor landed exactly on the staged key: step off it below.
            self.current.is_some()
        };

        loop {
            if positioned {
                // If there are multiple cursors on that key, move them along.
                self.advance_duplicates(direction);

                // Move the selected cursor itself (exhaustion is fine).
                if let Some(idx) = self.current {
                    if let Some(cursor) = self.cursors.get_mut(idx) {
                        match direction {
                            Direction::Forward => cursor.next(),
                            Direction::Reverse => cursor.prev(),
                        };
                    }
                }
            }

            // Find the cursor(s) with the smallest (largest) key.
            if !self.pick_current(direction == Direction::Forward)? {
                return Ok(());
            }

            // Landed on a tombstone: move again.
            positioned = true;
        }
    }

    /// Primes every per-chunk cursor for a scan in the given direction.
    ///
    /// Without a staged key each cursor starts at its chunk's first (last)
    /// item. With one, each cursor is positioned just past it — except
    /// cursors landing exactly on the key, which are recorded so the scan
    /// steps off the key first.
    fn seed(&mut self, direction: Direction) {
        self.multiple = false;

        let key = self.key.clone();

        // With no staged key every cursor starts from scratch, so no
        // selection can carry over.
        if key.is_none() {
            self.current = None;
        }

        for idx in (0..self.cursors.len()).rev() {
            match &key {
                None => {
                    if let Some(cursor) = self.cursors.get_mut(idx) {
                        cursor.reset();
                        match direction {
                            Direction::Forward => cursor.next(),
                            Direction::Reverse => cursor.prev(),
                        };
                    }
                }
                Some(key) if Some(idx) != self.current => {
                    let Some(cursor) = self.cursors.get_mut(idx) else {
                        continue;
                    };

                    match (cursor.search_near(key), direction) {
                        (Some(Ordering::Less), Direction::Forward) => {
                            cursor.next();
                        }
                        (Some(Ordering::Greater), Direction::Reverse) => {
                            cursor.prev();
                        }
                        (Some(Ordering::Equal), _) => {
                            if self.current.is_none() {
                                self.current = Some(idx);
                            } else {
                                self.multiple = true;
                            }
                        }
                        _ => {}
                    }
                }
                Some(_) => {
                    // The selected cursor already sits on the key.
                }
            }
        }

        self.iterating = Some(direction);
    }

    /// Steps every non-selected cursor parked on the current key, so the
    /// newest chunk's copy is the one the scan keeps.
    fn advance_duplicates(&mut self, direction: Direction) {
        if !self.multiple {
            return;
        }

        let Some(selected) = self.current else {
            return;
        };

        let Some(selected_key) = self
            .cursors
            .get(selected)
            .and_then(CursorOps::key)
            .cloned()
        else {
            return;
        };

        // Only cursors older than the selected one can share its key.
        let mut behind_selected = false;

        for idx in (0..self.cursors.len()).rev() {
            if idx == selected {
                behind_selected = true;
                continue;
            }
            if !behind_selected {
                continue;
            }

            let Some(key) = self.cursors.get(idx).and_then(CursorOps::key).cloned() else {
                continue;
            };

            if self.tree.compare_keys(&key, &selected_key) != Ordering::Equal {
                continue;
            }

            if let Some(cursor) = self.cursors.get_mut(idx) {
                match direction {
                    Direction::Forward => cursor.next(),
                    Direction::Reverse => cursor.prev(),
                };
            }
        }
    }

    /// Selects the positioned cursor with the smallest (largest) key,
    /// newest chunk winning ties, and materializes its item.
    ///
    /// Returns `true` if the selected item is a tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no cursor is positioned.
    fn pick_current(&mut self, smallest: bool) -> crate::Result<bool> {
        let mut selected: Option<usize> = None;
        let mut multiple = false;

        for idx in (0..self.cursors.len()).rev() {
            if self.cursors.get(idx).and_then(CursorOps::key).is_none() {
                continue;
            }

            match selected {
                None => selected = Some(idx),
                Some(winner) => match self.compare_current_keys(idx, winner) {
                    Some(cmp)
                        if (smallest && cmp == Ordering::Less)
                            || (!smallest && cmp == Ordering::Greater) =>
                    {
                        selected = Some(idx);
                        multiple = false;
                    }
                    Some(Ordering::Equal) => multiple = true,
                    _ => {}
                },
            }
        }

        let Some(idx) = selected else {
            self.current = None;
            self.key = None;
            self.value = None;
            return Err(Error::NotFound);
        };

        self.current = Some(idx);
        self.multiple = multiple;

        let item = self
            .cursors
            .get(idx)
            .and_then(|cursor| cursor.key().cloned().zip(cursor.value().cloned()));

        #[expect(clippy::expect_used, reason = "the selected cursor is positioned")]
        let (key, value) = item.expect("selected cursor should be positioned");

        if is_tombstone(&value) {
            self.key = None;
            self.value = None;
            Ok(true)
        } else {
            self.key = Some(key);
            self.value = Some(value);
            Ok(false)
        }
    }
}
