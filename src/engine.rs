// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Imaging engine seam
//!
//! The catalog never decodes pixels itself. Everything it needs from an
//! imaging engine goes through [`ImageEngine`], so projects can be driven by
//! the bundled [`LocalImageEngine`] or by any other implementation (a bridge
//! to an external viewer, or a fake in tests).

use crate::error::CatalogError;
use crate::provider::{ImageProvider, LocalImageProvider};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use thiserror::Error;

/// What the engine reports about an image it could open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Engine-specific format name
    pub format: String,
}

/// Failures reported by an imaging engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Nothing exists at the URI
    #[error("Image not found: {0}")]
    Missing(String),

    /// The resource exists but the engine cannot read it
    #[error("Cannot read {uri}: {reason}")]
    Unsupported {
        /// URI that was opened
        uri: String,
        /// Decoder message
        reason: String,
    },

    /// The engine cannot resolve this kind of URI
    #[error("Invalid image URI: {0}")]
    InvalidUri(String),

    /// Filesystem failure while reading or writing
    #[error("I/O error for {uri}: {source}")]
    Io {
        /// URI or path being accessed
        uri: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl From<EngineError> for CatalogError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Missing(uri) => Self::NotFound(uri),
            EngineError::Unsupported { uri, reason } => Self::UnsupportedFormat { uri, reason },
            EngineError::InvalidUri(uri) => Self::InvalidUri {
                uri,
                reason: "not resolvable by the imaging engine".into(),
            },
            EngineError::Io { uri, source } => Self::io(uri, source),
        }
    }
}

/// Capabilities the catalog consumes from an imaging engine
pub trait ImageEngine {
    /// Version string recorded in projects saved with this engine
    fn version(&self) -> String;

    /// Open and describe the image at `uri`
    fn open_image(&self, uri: &str) -> Result<ImageInfo, EngineError>;

    /// Render a thumbnail of at most `max_size` pixels per side to `dest`
    fn write_thumbnail(&self, uri: &str, dest: &Path, max_size: u32) -> Result<(), EngineError>;
}

/// Engine for local files in any format the `image` crate decodes
#[derive(Debug, Clone, Default)]
pub struct LocalImageEngine {
    provider: LocalImageProvider,
}

impl LocalImageEngine {
    /// Version reported by this engine
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Create the engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reader(&self, uri: &str) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, EngineError> {
        let path = self
            .provider
            .path_from_uri(uri)
            .map_err(|_| EngineError::InvalidUri(uri.to_string()))?;
        if !path.is_file() {
            return Err(EngineError::Missing(uri.to_string()));
        }
        ImageReader::open(&path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(|source| EngineError::Io {
                uri: uri.to_string(),
                source,
            })
    }

    fn decode(&self, uri: &str) -> Result<DynamicImage, EngineError> {
        self.reader(uri)?
            .decode()
            .map_err(|e| EngineError::Unsupported {
                uri: uri.to_string(),
                reason: e.to_string(),
            })
    }
}

impl ImageEngine for LocalImageEngine {
    fn version(&self) -> String {
        Self::VERSION.to_string()
    }

    fn open_image(&self, uri: &str) -> Result<ImageInfo, EngineError> {
        let reader = self.reader(uri)?;
        let format = reader.format().ok_or_else(|| EngineError::Unsupported {
            uri: uri.to_string(),
            reason: "unrecognized image format".into(),
        })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| EngineError::Unsupported {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ImageInfo {
            width,
            height,
            format: format!("{format:?}"),
        })
    }

    fn write_thumbnail(&self, uri: &str, dest: &Path, max_size: u32) -> Result<(), EngineError> {
        let thumbnail = self.decode(uri)?.thumbnail(max_size, max_size);
        // JPEG has no alpha channel
        DynamicImage::ImageRgb8(thumbnail.to_rgb8())
            .save_with_format(dest, ImageFormat::Jpeg)
            .map_err(|e| EngineError::Unsupported {
                uri: dest.display().to_string(),
                reason: e.to_string(),
            })
    }
}
