// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the project catalog

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// Errors raised by catalog, taxonomy and URI bookkeeping operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A caller-supplied argument was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A path class with this id already has a canonical instance
    #[error("Path class already exists: '{id}'")]
    AlreadyExists {
        /// Derived id of the existing class
        id: String,
    },

    /// The target directory cannot hold a project in its current state
    #[error("Invalid project state at {}: {reason}", path.display())]
    InvalidState {
        /// Offending location
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// A file, entry or project descriptor does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The engine could not open the image
    #[error("Unsupported image format for {uri}: {reason}")]
    UnsupportedFormat {
        /// URI handed to the engine
        uri: String,
        /// Engine-reported reason
        reason: String,
    },

    /// A URI could not be converted to or from a local path
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri {
        /// The offending URI (or path, when encoding failed)
        uri: String,
        /// Why it was rejected
        reason: String,
    },

    /// Filesystem failure, surfaced as reported by the OS
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Location being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A persisted JSON document could not be read or written
    #[error("Failed to (de)serialize {}: {source}", path.display())]
    Serialization {
        /// Document location
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Wrap an I/O error with the path it concerns
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// True when the failure stems from caller input (bad arguments or
    /// paths) rather than from the engine or the filesystem.
    ///
    /// Input errors are fixed by correcting the request; engine errors are
    /// usually handled by relinking or skipping the image.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::AlreadyExists { .. }
                | Self::InvalidState { .. }
                | Self::NotFound(_)
                | Self::InvalidUri { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_classified() {
        assert!(CatalogError::NotFound("x".into()).is_input_error());
        assert!(CatalogError::AlreadyExists { id: "Tumor".into() }.is_input_error());
        let engine = CatalogError::UnsupportedFormat {
            uri: "file:///tmp/a.txt".into(),
            reason: "unknown format".into(),
        };
        assert!(!engine.is_input_error());
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = CatalogError::InvalidState {
            path: PathBuf::from("/data/proj"),
            reason: "directory is not empty".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/proj"));
        assert!(msg.contains("not empty"));
    }
}
