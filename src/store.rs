// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::cursor::{Cursor, CursorOptions};
use crate::{Config, Error, Tree};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// The schema lock, serializing structural operations
///
/// During a chunk switch it is only ever acquired through the tree-lock
/// guard, never the other way around; taking it in the reverse order would
/// deadlock against writers, so no such path exists.
#[derive(Default)]
pub(crate) struct SchemaLock(Mutex<()>);

impl SchemaLock {
    pub(crate) fn acquire(&self) -> MutexGuard<'_, ()> {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let guard = self.0.lock().expect("lock is poisoned");
        guard
    }
}

/// The schema layer: a registry of named trees
///
/// Routes `lsm:` URIs to tree creation and cursor opening, and owns the
/// schema lock that chunk switches serialize against. Cloning is cheap and
/// clones refer to the same store.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    schema: SchemaLock,
    trees: RwLock<FxHashMap<Arc<str>, Tree>>,
}

impl Store {
    /// Creates a tree under the given `lsm:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for URIs with another scheme, or
    /// if the URI already names a tree.
    pub fn create(&self, uri: &str, config: Config) -> crate::Result<Tree> {
        if !uri.starts_with("lsm:") {
            return Err(Error::InvalidArgument("URI must use the lsm: scheme"));
        }

        let _schema = self.inner.schema.acquire();

        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let mut trees = self.inner.trees.write().expect("lock is poisoned");

        if trees.contains_key(uri) {
            return Err(Error::InvalidArgument("tree already exists"));
        }

        let tree = Tree::create(uri, config);
        trees.insert(uri.into(), tree.clone());

        Ok(tree)
    }

    /// Looks up a tree by URI.
    #[must_use]
    pub fn tree(&self, uri: &str) -> Option<Tree> {
        #[expect(clippy::expect_used, reason = "lock is poisoned")]
        let trees = self.inner.trees.read().expect("lock is poisoned");
        trees.get(uri).cloned()
    }

    /// Opens a cursor over the tree at the given URI.
    ///
    /// The cursor defaults to overwrite mode (writes do not check for an
    /// existing key first).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for URIs with another scheme or
    /// that name no tree.
    pub fn open_cursor(&self, uri: &str) -> crate::Result<Cursor> {
        self.open_cursor_with(uri, CursorOptions::default())
    }

    /// Opens a cursor with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for URIs with another scheme or
    /// that name no tree.
    pub fn open_cursor_with(&self, uri: &str, options: CursorOptions) -> crate::Result<Cursor> {
        if !uri.starts_with("lsm:") {
            return Err(Error::InvalidArgument("URI must use the lsm: scheme"));
        }

        let tree = self
            .tree(uri)
            .ok_or(Error::InvalidArgument("no such tree"))?;

        Ok(Cursor::new(self.clone(), tree, options))
    }

    /// Rolls over the primary chunk of the tree at the given URI: seals it
    /// and installs a fresh one.
    ///
    /// This is the operation the write path triggers once the primary
    /// outgrows the configured threshold; open cursors pick the new
    /// topology up on their next operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the URI names no tree.
    pub fn switch(&self, uri: &str) -> crate::Result<()> {
        let tree = self
            .tree(uri)
            .ok_or(Error::InvalidArgument("no such tree"))?;

        let mut guard = tree.lock_chunks();
        guard.switch(&self.inner.schema)
    }

    pub(crate) fn schema_lock(&self) -> &SchemaLock {
        &self.inner.schema
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::{Config, Error};
    use test_log::test;

    #[test]
    fn store_create_routes_lsm_uris() -> crate::Result<()> {
        let store = Store::default();

        let tree = store.create("lsm:users", Config::default())?;
        assert_eq!("lsm:users", tree.uri());

        assert!(store.tree("lsm:users").is_some());
        assert!(store.tree("lsm:other").is_none());

        Ok(())
    }

    #[test]
    fn store_create_rejects_foreign_scheme() {
        let store = Store::default();

        assert!(matches!(
            store.create("table:users", Config::default()),
            Err(Error::InvalidArgument(_)),
        ));
        assert!(matches!(
            store.open_cursor("file:users"),
            Err(Error::InvalidArgument(_)),
        ));
    }

    #[test]
    fn store_create_rejects_duplicates() -> crate::Result<()> {
        let store = Store::default();
        store.create("lsm:t", Config::default())?;

        assert!(matches!(
            store.create("lsm:t", Config::default()),
            Err(Error::InvalidArgument(_)),
        ));

        Ok(())
    }

    #[test]
    fn store_open_cursor_unknown_tree() {
        let store = Store::default();

        assert!(matches!(
            store.open_cursor("lsm:missing"),
            Err(Error::InvalidArgument(_)),
        ));
    }

    #[test]
    fn store_switch_seals_primary() -> crate::Result<()> {
        let store = Store::default();
        let tree = store.create("lsm:t", Config::default())?;

        assert_eq!(1, tree.chunk_count());
        store.switch("lsm:t")?;
        assert_eq!(2, tree.chunk_count());

        Ok(())
    }
}
