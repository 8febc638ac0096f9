// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::value::{KvPair, UserKey, UserValue};
use crossbeam_skiplist::SkipMap;
use std::ops::Bound;
use std::sync::{
    atomic::{AtomicU64, Ordering::AcqRel, Ordering::Acquire},
    Arc,
};

/// Ephemeral sorted storage for the live (primary) chunk
///
/// Writes land here until the chunk is sealed into a checkpoint snapshot.
pub struct LiveStore {
    /// The actual content, stored in a lock-free skiplist.
    items: SkipMap<UserKey, UserValue>,

    /// Approximate memory usage.
    ///
    /// Shared with the tree, which uses it to decide when to roll the
    /// primary chunk over.
    approximate_size: Arc<AtomicU64>,
}

impl LiveStore {
    pub fn new() -> Self {
        Self {
            items: SkipMap::new(),
            approximate_size: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Inserts an item, returning the new approximate size.
    pub fn insert(&self, key: UserKey, value: UserValue) -> u64 {
        #[expect(
            clippy::expect_used,
            reason = "a single item never exceeds u64 bytes"
        )]
        let item_size: u64 = (key.len() + value.len() + std::mem::size_of::<KvPair>())
            .try_into()
            .expect("should fit into u64");

        let size_before = self.approximate_size.fetch_add(item_size, AcqRel);

        self.items.insert(key, value);

        size_before + item_size
    }

    /// Gets approximate size in bytes.
    pub fn size(&self) -> u64 {
        self.approximate_size.load(Acquire)
    }

    /// Handle to the approximate size counter, shared with the tree.
    pub fn size_handle(&self) -> Arc<AtomicU64> {
        self.approximate_size.clone()
    }

    /// Point lookup.
    pub fn get(&self, key: &[u8]) -> Option<KvPair> {
        self.items
            .get(key)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// First item.
    pub fn first(&self) -> Option<KvPair> {
        self.items
            .front()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Last item.
    pub fn last(&self) -> Option<KvPair> {
        self.items
            .back()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Lowest item strictly above `key`.
    pub fn next_after(&self, key: &[u8]) -> Option<KvPair> {
        self.items
            .lower_bound(Bound::Excluded(key))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Highest item strictly below `key`.
    pub fn prev_before(&self, key: &[u8]) -> Option<KvPair> {
        self.items
            .upper_bound(Bound::Excluded(key))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Lowest item at or above `key`.
    pub fn lower_bound(&self, key: &[u8]) -> Option<KvPair> {
        self.items
            .lower_bound(Bound::Included(key))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Sorted snapshot of the current contents.
    pub fn snapshot(&self) -> Vec<KvPair> {
        self.items
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LiveStore;
    use test_log::test;

    #[test]
    fn live_store_insert_get() {
        let store = LiveStore::new();
        assert!(store.first().is_none());

        store.insert("b".into(), "2".into());
        store.insert("a".into(), "1".into());

        assert_eq!(2, store.snapshot().len());
        assert!(store.size() > 0);

        let (key, value) = store.get(b"a").expect("should exist");
        assert_eq!(&*key, b"a");
        assert_eq!(&*value, b"1");

        assert!(store.get(b"c").is_none());
    }

    #[test]
    fn live_store_bounds() {
        let store = LiveStore::new();

        store.insert("a".into(), "1".into());
        store.insert("c".into(), "3".into());

        assert_eq!(&*store.first().expect("should exist").0, b"a");
        assert_eq!(&*store.last().expect("should exist").0, b"c");

        assert_eq!(&*store.next_after(b"a").expect("should exist").0, b"c");
        assert_eq!(&*store.prev_before(b"c").expect("should exist").0, b"a");
        assert_eq!(&*store.lower_bound(b"b").expect("should exist").0, b"c");

        assert!(store.next_after(b"c").is_none());
        assert!(store.prev_before(b"a").is_none());
    }

    #[test]
    fn live_store_size_grows() {
        let store = LiveStore::new();

        let before = store.size();
        let after = store.insert("hello".into(), "world".into());

        assert!(after > before);
        assert_eq!(after, store.size());
    }

    #[test]
    fn live_store_snapshot_sorted() {
        let store = LiveStore::new();

        store.insert("c".into(), "3".into());
        store.insert("a".into(), "1".into());
        store.insert("b".into(), "2".into());

        let keys: Vec<_> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(vec![b"a".as_slice(), b"b", b"c"], keys.iter().map(|k| &**k).collect::<Vec<_>>());
    }
}
