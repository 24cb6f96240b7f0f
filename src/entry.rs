// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Image entries - catalog records binding a project slot to an image URI

use crate::engine::ImageEngine;
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the thumbnail inside an entry slot
pub const THUMBNAIL_FILE: &str = "thumbnail.jpg";

/// File name of the per-image data inside an entry slot
pub const DATA_FILE: &str = "data.qpdata";

/// Numeric identity of an entry within its project
pub type EntryId = u64;

/// Staining / imaging modality of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    /// Brightfield, hematoxylin and DAB
    #[serde(rename = "BRIGHTFIELD_H_DAB")]
    BrightfieldHDab,
    /// Brightfield, hematoxylin and eosin
    #[serde(rename = "BRIGHTFIELD_H_E")]
    BrightfieldHE,
    /// Brightfield, other stains
    BrightfieldOther,
    /// Fluorescence
    Fluorescence,
    /// Anything else
    Other,
    /// Not set yet
    #[default]
    Unset,
}

impl ImageType {
    /// All image types, in display order
    pub const ALL: [Self; 6] = [
        Self::BrightfieldHDab,
        Self::BrightfieldHE,
        Self::BrightfieldOther,
        Self::Fluorescence,
        Self::Other,
        Self::Unset,
    ];

    /// Persisted name
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BrightfieldHDab => "BRIGHTFIELD_H_DAB",
            Self::BrightfieldHE => "BRIGHTFIELD_H_E",
            Self::BrightfieldOther => "BRIGHTFIELD_OTHER",
            Self::Fluorescence => "FLUORESCENCE",
            Self::Other => "OTHER",
            Self::Unset => "UNSET",
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::BrightfieldHDab => "Brightfield (H-DAB)",
            Self::BrightfieldHE => "Brightfield (H&E)",
            Self::BrightfieldOther => "Brightfield (other)",
            Self::Fluorescence => "Fluorescence",
            Self::Other => "Other",
            Self::Unset => "Not set",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImageType {
    type Err = CatalogError;

    /// Parse a persisted name, case-insensitively; `-` may replace `_`
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.code() == normalized)
            .ok_or_else(|| CatalogError::InvalidArgument(format!("unknown image type '{s}'")))
    }
}

/// A catalog record for one image.
///
/// Entries are only created by [`crate::project::Project::add_image`] or
/// when a saved project is loaded; adding an image registers it with the
/// engine and writes slot artifacts, which a bare constructor cannot do.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    id: EntryId,
    entry_path: PathBuf,
    uri: String,
    image_type: ImageType,
    image_name: String,
    description: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl ImageEntry {
    pub(crate) fn new(id: EntryId, entry_path: PathBuf, uri: String, image_name: String) -> Self {
        Self {
            id,
            entry_path,
            uri,
            image_type: ImageType::Unset,
            image_name,
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Identity within the project
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Project-local storage slot
    #[must_use]
    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    /// Location of the thumbnail written when the image was added
    #[must_use]
    pub fn thumbnail_path(&self) -> PathBuf {
        self.entry_path.join(THUMBNAIL_FILE)
    }

    /// Location of the per-image data file written on save
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.entry_path.join(DATA_FILE)
    }

    /// Current URI of the backing image
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub(crate) fn set_uri(&mut self, uri: String) {
        self.uri = uri;
    }

    /// Declared image type
    #[must_use]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Declare the image type
    pub fn set_image_type(&mut self, image_type: ImageType) {
        self.image_type = image_type;
    }

    /// Display name
    #[must_use]
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Rename the entry for display
    pub fn set_image_name(&mut self, name: impl Into<String>) {
        self.image_name = name.into();
    }

    /// Free-text description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set or clear the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Key/value metadata
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Mutable key/value metadata
    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.metadata
    }

    /// Ask the engine whether the current URI can be opened.
    ///
    /// Missing or unreadable images report `false`; this never fails.
    pub fn is_readable(&self, engine: &dyn ImageEngine) -> bool {
        match engine.open_image(&self.uri) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Entry {} is not readable: {}", self.id, e);
                false
            }
        }
    }
}

impl fmt::Display for ImageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ImageEntry {} '{}' {}>", self.id, self.image_name, self.uri)
    }
}
