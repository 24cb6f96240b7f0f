// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Translation between filesystem paths and image URIs

use crate::error::{CatalogError, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// Maps local paths to the URIs stored in image entries and back
pub trait ImageProvider {
    /// Canonical URI for a filesystem path
    fn uri_from_path(&self, path: &Path) -> Result<String>;

    /// Local path denoted by a URI
    fn path_from_uri(&self, uri: &str) -> Result<PathBuf>;

    /// Re-anchor `uri` from `from_dir` to `to_dir`.
    ///
    /// Returns `None` if the URI is not local or does not lie below
    /// `from_dir`.
    fn rebase(&self, uri: &str, from_dir: &Path, to_dir: &Path) -> Option<String> {
        let path = self.path_from_uri(uri).ok()?;
        let relative = path.strip_prefix(from_dir).ok()?;
        self.uri_from_path(&to_dir.join(relative)).ok()
    }
}

/// `file:` URIs for images on local or mounted filesystems
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImageProvider;

impl LocalImageProvider {
    /// Absolute form of `path`, with symlinks resolved when it exists
    pub fn absolute(path: &Path) -> Result<PathBuf> {
        match path.canonicalize() {
            Ok(canonical) => Ok(canonical),
            Err(_) => std::path::absolute(path).map_err(|e| CatalogError::io(path, e)),
        }
    }
}

impl ImageProvider for LocalImageProvider {
    fn uri_from_path(&self, path: &Path) -> Result<String> {
        let absolute = Self::absolute(path)?;
        Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|()| CatalogError::InvalidUri {
                uri: absolute.display().to_string(),
                reason: "path cannot be expressed as a file URI".into(),
            })
    }

    fn path_from_uri(&self, uri: &str) -> Result<PathBuf> {
        let url = Url::parse(uri).map_err(|e| CatalogError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "file" {
            return Err(CatalogError::InvalidUri {
                uri: uri.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        url.to_file_path().map_err(|()| CatalogError::InvalidUri {
            uri: uri.to_string(),
            reason: "URI does not denote a local path".into(),
        })
    }
}
