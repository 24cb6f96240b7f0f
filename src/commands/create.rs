// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Create an empty project

use crate::config::Config;
use crate::project::Project;
use anyhow::{Context, Result};
use std::path::Path;

/// Create and save a project at `path`; an existing project is left as is
pub fn run(path: &Path, config: &Config) -> Result<()> {
    let mut project = Project::builder(path)
        .config(config.clone())
        .open()
        .with_context(|| format!("Failed to create project at {}", path.display()))?;

    if project.path().is_file() {
        println!("Project already exists: {}", project.path().display());
        return Ok(());
    }

    project.save()?;
    println!("Created project: {}", project.name());
    println!("  path: {}", project.path().display());
    Ok(())
}
