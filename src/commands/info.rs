// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show project metadata

use super::{format_timestamp, open_project};
use crate::config::Config;
use anyhow::Result;
use serde_json::json;
use std::path::Path;

/// Print name, locations, version, timestamps and counts
pub fn run(path: &Path, json: bool, config: &Config) -> Result<()> {
    let project = open_project(path, config)?;

    if json {
        let info = json!({
            "name": project.name(),
            "path": project.path(),
            "uri": project.uri(),
            "uriPrevious": project.uri_previous(),
            "version": project.version(),
            "createTimestamp": project.timestamp_creation(),
            "modifyTimestamp": project.timestamp_modification(),
            "pathClasses": project.path_classes().map(|c| c.id().to_string()).collect::<Vec<_>>(),
            "images": project.images().len(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Project: {}", project.name());
    println!("  path:     {}", project.path().display());
    println!("  uri:      {}", project.uri());
    if let Some(previous) = project.uri_previous() {
        println!("  moved from: {previous}");
    }
    println!("  version:  {}", project.version().unwrap_or("-"));
    println!("  created:  {}", format_timestamp(project.timestamp_creation()));
    println!("  modified: {}", format_timestamp(project.timestamp_modification()));
    println!("  classes:  {}", project.path_class_keys().len());
    println!("  images:   {}", project.images().len());
    Ok(())
}
