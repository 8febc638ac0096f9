// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur in the cursor layer
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// No matching key was found
    NotFound,

    /// A non-overwrite insert collided with an existing key
    DuplicateKey,

    /// Invalid cursor usage, URI or configuration
    InvalidArgument(&'static str),

    /// The zero-length value is reserved as the tombstone marker
    /// and cannot be stored
    ValueNotSet,

    /// A per-chunk cursor could not be opened
    ChunkOpen(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LsmCursorError: {self:?}")
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Returns `true` if the error is [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub(crate) fn key_not_set() -> Self {
        Self::InvalidArgument("cursor key is not set")
    }

    pub(crate) fn value_not_set() -> Self {
        Self::InvalidArgument("cursor value is not set")
    }
}

/// Cursor result
pub type Result<T> = std::result::Result<T, Error>;
