// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! On-disk layout of a project directory
//!
//! ```text
//! <dir>/project.qpproj             descriptor
//! <dir>/classifiers/classes.json   path classes
//! <dir>/data/<id>/thumbnail.jpg    written when the image is added
//! <dir>/data/<id>/data.qpdata      per-image data, written on save
//! ```

use crate::entry::{EntryId, ImageType};
use crate::error::{CatalogError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension required for project descriptor files
pub const PROJECT_EXTENSION: &str = "qpproj";

/// Descriptor file name used when a project is addressed by directory
pub const PROJECT_FILE: &str = "project.qpproj";

/// Directory holding one slot per image entry
pub const DATA_DIR: &str = "data";

/// Path classes file, relative to the project directory
pub const CLASSES_FILE: &str = "classifiers/classes.json";

/// Directory holding [`CLASSES_FILE`]
const CLASSIFIERS_DIR: &str = "classifiers";

/// The project descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectDescriptor {
    /// Engine version that wrote the file
    #[serde(default)]
    pub version: Option<String>,
    pub create_timestamp: i64,
    pub modify_timestamp: i64,
    /// URI of the descriptor at the time it was written
    pub uri: String,
    #[serde(rename = "lastID")]
    pub last_id: EntryId,
    #[serde(default)]
    pub images: Vec<EntryRecord>,
}

/// One image entry inside the descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntryRecord {
    #[serde(rename = "entryID")]
    pub entry_id: EntryId,
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub server_builder: ServerBuilder,
}

/// How the engine locates the image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ServerBuilder {
    pub uri: String,
}

/// Contents of `classifiers/classes.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassesFile {
    #[serde(default)]
    pub path_classes: Vec<ClassRecord>,
}

/// One path class: its lineage from the origin and packed ARGB color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ClassRecord {
    pub names: Vec<String>,
    /// Packed ARGB stored as a signed 32-bit integer
    pub color: i32,
}

/// Contents of `data/<id>/data.qpdata`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageData {
    pub uri: String,
    #[serde(default)]
    pub image_type: ImageType,
}

/// Reinterpret packed ARGB as the signed value written to disk
pub(crate) fn argb_to_i32(argb: u32) -> i32 {
    i32::from_ne_bytes(argb.to_ne_bytes())
}

/// Inverse of [`argb_to_i32`]
pub(crate) fn i32_to_argb(value: i32) -> u32 {
    u32::from_ne_bytes(value.to_ne_bytes())
}

/// Split a user-supplied location into `(directory, descriptor file)`
pub(crate) fn resolve_location(path: &Path) -> Result<(PathBuf, PathBuf)> {
    if path.is_dir() {
        return Ok((path.to_path_buf(), path.join(PROJECT_FILE)));
    }
    match path.extension() {
        None => Ok((path.to_path_buf(), path.join(PROJECT_FILE))),
        Some(ext) if ext == PROJECT_EXTENSION => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Ok((dir, path.to_path_buf()))
        }
        Some(ext) => Err(CatalogError::InvalidArgument(format!(
            "project file must have extension .{PROJECT_EXTENSION}, got .{}",
            ext.to_string_lossy()
        ))),
    }
}

/// True if `dir` holds nothing but the directories a project writes into
/// before its descriptor exists (slots from unsaved `add_image` calls).
pub(crate) fn holds_only_project_artifacts(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))? {
        let entry = entry.map_err(|e| CatalogError::io(dir, e))?;
        let is_dir = entry.file_type().map_err(|e| CatalogError::io(entry.path(), e))?.is_dir();
        let name = entry.file_name();
        if !is_dir || (name != DATA_DIR && name != CLASSIFIERS_DIR) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Read and parse a JSON document
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a JSON document, replacing the target atomically
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        CatalogError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(|e| CatalogError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| CatalogError::io(path, e))
}
