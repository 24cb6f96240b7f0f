// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod add;
pub mod check;
pub mod classes;
pub mod completions;
pub mod create;
pub mod info;
pub mod relink;

use crate::config::Config;
use crate::project::Project;
use anyhow::{Context, Result};
use std::path::Path;

/// Open an existing project with the loaded configuration
pub(crate) fn open_project(path: &Path, config: &Config) -> Result<Project> {
    Project::builder(path)
        .create(false)
        .config(config.clone())
        .open()
        .with_context(|| format!("Failed to open project at {}", path.display()))
}

/// Format a millisecond timestamp for humans
pub(crate) fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |t| t.to_rfc3339())
}
