// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! qpcatalog library - project catalogs for whole-slide pathology images
//!
//! A project is a directory holding an ordered set of path classes
//! (hierarchical classification labels with colors) and image entries
//! (records that point at slide images by URI). Images are opened through
//! an [`engine::ImageEngine`], so the catalog itself never decodes pixels.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classes;
pub mod color;
pub mod commands;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod project;
pub mod provider;

/// Prelude for common imports
pub mod prelude {
    pub use crate::classes::{PathClass, PathClassKey, PathClassRegistry};
    pub use crate::color::Rgb;
    pub use crate::engine::{EngineError, ImageEngine, ImageInfo, LocalImageEngine};
    pub use crate::entry::{EntryId, ImageEntry, ImageType};
    pub use crate::error::{CatalogError, Result};
    pub use crate::project::{Project, ProjectBuilder, ProjectSession};
    pub use crate::provider::{ImageProvider, LocalImageProvider};
}
