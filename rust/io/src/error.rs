// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for loading sources and writing dumps.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source is missing, is not a polygon collection, or lacks a
    /// requested attribute field.
    #[error("cannot read {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// The declared encoding does not decode the source text.
    #[error("source text is not valid {encoding}: {reason}")]
    EncodingError { encoding: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reloaded dump differs from the mesh it was written from.
    #[error("dump does not match mesh: {0}")]
    DumpMismatch(String),

    #[error("no source loaded")]
    NothingLoaded,

    #[error("no mesh built")]
    NothingBuilt,

    #[error(transparent)]
    Topology(#[from] area_mesher_topology::Error),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
