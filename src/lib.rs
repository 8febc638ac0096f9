// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Merging cursor layer for chunk-based log-structured merge-trees (LSM-trees/LSMTs).
//!
//! ##### NOTE
//!
//! > This crate only provides the cursor layer of a chunked LSM engine, not a
//! > full storage engine. Chunks are kept by an in-memory ordered store; there
//! > is no write-ahead log and no on-disk format.
//!
//! ##### About
//!
//! A tree is an ordered list of *chunks*: sealed, immutable ordered maps plus
//! one live in-memory chunk (the *primary*) that receives all writes. A
//! [`Cursor`] presents a single logically ordered key/value view over all of
//! them:
//!
//! - reads fan out across chunks and are merged, newest chunk winning ties
//! - point reads probe per-chunk Bloom filters to skip sealed chunks
//! - deletes write a zero-length *tombstone* that masks older versions
//! - when the primary chunk outgrows its threshold, it is sealed and a fresh
//!   primary is installed (a *chunk switch*); open cursors re-synchronize
//!   with the new topology on their next operation
//!
//! Because the empty value is reserved as the tombstone marker, applications
//! cannot store zero-length values.
//!
//! # Example usage
//!
//! ```
//! use lsm_cursor::{Config, Store};
//!
//! let store = Store::default();
//! store.create("lsm:example", Config::default())?;
//!
//! let mut cursor = store.open_cursor("lsm:example")?;
//!
//! cursor.set_key("my_key");
//! cursor.set_value("my_value");
//! cursor.insert()?;
//!
//! cursor.set_key("my_key");
//! cursor.search()?;
//! assert_eq!(Some(&"my_value".into()), cursor.value());
//!
//! // Iterate in key order
//! cursor.reset()?;
//! while cursor.next().is_ok() {
//!     // cursor.key() / cursor.value()
//! }
//! #
//! # Ok::<(), lsm_cursor::Error>(())
//! ```

#![doc(html_logo_url = "https://raw.githubusercontent.com/fjall-rs/lsm-tree/main/logo.png")]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/fjall-rs/lsm-tree/main/logo.png")]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

#[doc(hidden)]
pub mod bloom;

mod chunk;
mod comparator;
mod config;
mod cursor;
mod error;
mod slice;
mod store;
mod tree;
mod value;

pub use {
    comparator::Comparator,
    config::Config,
    cursor::{Cursor, CursorOptions},
    error::{Error, Result},
    slice::Slice,
    store::Store,
    tree::Tree,
    value::{KvPair, UserKey, UserValue},
};
